//! Spritesheet grid packer.
//!
//! Packs equally sized sprites into a fixed-width grid, row-major, in the
//! order given. The optional placeholder occupies the first cell and stays
//! transparent, as does the padding at the end of the last row.

use image::{imageops, Rgba, RgbaImage};

/// Grid geometry of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPacker {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Sprites per row.
    pub across: u32,
}

impl GridPacker {
    pub fn new(cell_width: u32, cell_height: u32, across: u32) -> Self {
        Self {
            cell_width,
            cell_height,
            across: across.max(1),
        }
    }

    /// Rows needed for `cells` cells.
    pub fn rows(&self, cells: usize) -> u32 {
        (cells as u32).div_ceil(self.across)
    }

    /// Pixel size of a sheet holding `cells` cells, `None` when it does not
    /// fit an image buffer.
    pub fn sheet_size(&self, cells: usize) -> Option<(u32, u32)> {
        let cells = u32::try_from(cells).ok()?;
        let width = self.across.checked_mul(self.cell_width)?;
        let height = cells.div_ceil(self.across).checked_mul(self.cell_height)?;
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        Some((width, height))
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin(&self, cell: usize) -> (u32, u32) {
        let cell = cell as u32;
        (
            (cell % self.across) * self.cell_width,
            (cell / self.across) * self.cell_height,
        )
    }

    /// Pack sprites into one image.
    ///
    /// `on_row` receives the completion percentage after each grid row.
    /// Sprites larger than a cell are clipped to it. Returns `None` when
    /// the grid is too large for one image.
    pub fn pack(
        &self,
        sprites: &[RgbaImage],
        placeholder: bool,
        mut on_row: impl FnMut(u8),
    ) -> Option<RgbaImage> {
        let offset = usize::from(placeholder);
        let cells = sprites.len() + offset;
        let (width, height) = self.sheet_size(cells)?;
        let rows = self.rows(cells);

        let mut sheet = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

        let per_row = self.across as usize;
        for row in 0..rows as usize {
            let start = row * per_row;
            let end = (start + per_row).min(cells);
            for cell in start.max(offset)..end {
                let sprite = &sprites[cell - offset];
                let (x, y) = self.cell_origin(cell);
                if sprite.width() > self.cell_width || sprite.height() > self.cell_height {
                    let clipped = imageops::crop_imm(
                        sprite,
                        0,
                        0,
                        sprite.width().min(self.cell_width),
                        sprite.height().min(self.cell_height),
                    )
                    .to_image();
                    imageops::replace(&mut sheet, &clipped, x as i64, y as i64);
                } else {
                    imageops::replace(&mut sheet, sprite, x as i64, y as i64);
                }
            }
            on_row((((row + 1) * 100) / rows as usize) as u8);
        }

        Some(sheet)
    }
}
