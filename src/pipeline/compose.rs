//! Sheet composing: load a sheet's sprites and write its image.

use std::path::PathBuf;

use image::RgbaImage;

use crate::cancel::CancelToken;
use crate::diagnostics::{Arg, Event, EventKind, MessageKind, Reporter};
use crate::error::{Halt, Result, TileError};
use crate::render::{load_sprite, quantize, write_indexed_png, write_png, ColourProfile, GridPacker};
use crate::types::Sheet;

/// Encoding switches for composed sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageSettings {
    /// Quantize every sheet to a 256-colour palette.
    pub palette: bool,
    /// Also write a palette-quantized copy next to each sheet.
    pub palette_copies: bool,
}

/// Load every registered sprite of a sheet.
///
/// Sprites of the wrong size or with an unusable colour profile are
/// reported and kept.
pub fn load_sheet_sprites(
    sheet: &Sheet,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> std::result::Result<Vec<RgbaImage>, Halt> {
    let mut images = Vec::with_capacity(sheet.sprites.len());

    for path in &sheet.sprites {
        cancel.check()?;
        reporter.progress_image(&sheet.name);

        let sprite = load_sprite(path)?;
        if let ColourProfile::Failed(reason) = &sprite.profile {
            reporter.error(
                MessageKind::ImageDecode,
                "Cannot apply the colour profile of {}: {}.",
                vec![Arg::Path(path.clone()), Arg::Text(reason.clone())],
            );
        }
        if sprite.width() != sheet.sprite_width || sprite.height() != sheet.sprite_height {
            reporter.error(
                MessageKind::SpriteSize,
                "{} is {}x{}, but {} sheet sprites have to be {}x{}.",
                vec![
                    Arg::Path(path.clone()),
                    Arg::from(sprite.width()),
                    Arg::from(sprite.height()),
                    Arg::Sheet(sheet.name.clone()),
                    Arg::from(sheet.sprite_width),
                    Arg::from(sheet.sprite_height),
                ],
            );
        }
        images.push(sprite.image);
    }

    Ok(images)
}

/// Pack loaded sprites into the sheet image and encode it.
///
/// Returns `false` without writing anything when there are no sprites.
pub fn write_sheet(
    sheet: &Sheet,
    sprites: &[RgbaImage],
    settings: ImageSettings,
    reporter: &Reporter,
) -> Result<bool> {
    if sprites.is_empty() {
        return Ok(false);
    }

    let packer = GridPacker::new(sheet.sprite_width, sheet.sprite_height, sheet.sprites_across);
    let image = packer
        .pack(sprites, sheet.has_placeholder, |percent| {
            reporter.progress_percent(&sheet.name, (u16::from(percent) * 9 / 10) as u8)
        })
        .ok_or_else(|| TileError::Image {
            path: sheet.output.clone(),
            message: format!(
                "A grid of {} sprites {} across at {}x{} is too large for one image",
                sheet.cell_count(),
                sheet.sprites_across,
                sheet.sprite_width,
                sheet.sprite_height
            ),
        })?;

    if settings.palette {
        write_indexed_png(&quantize(&image), &sheet.output)?;
    } else {
        write_png(&image, &sheet.output)?;
        if settings.palette_copies {
            write_indexed_png(&quantize(&image), &palette_copy_path(sheet))?;
        }
    }

    reporter.progress_percent(&sheet.name, 100);
    reporter.status(
        Event::new(EventKind::Status, "Finished composing: tilesheet {}.")
            .arg(Arg::Sheet(sheet.name.clone())),
    );

    Ok(true)
}

/// Load and write one sheet, with the start markers around each step.
pub fn compose_sheet(
    sheet: &Sheet,
    settings: ImageSettings,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> std::result::Result<bool, Halt> {
    cancel.check()?;

    reporter.status(
        Event::new(EventKind::Status, "Start Loading sprites for: [{}] tilesheet {}.")
            .arg(sheet.kind)
            .arg(Arg::Sheet(sheet.name.clone())),
    );
    reporter.emit(Event::new(EventKind::Loading, "{}").arg(Arg::Sheet(sheet.name.clone())));
    let sprites = load_sheet_sprites(sheet, reporter, cancel)?;

    reporter.status(
        Event::new(EventKind::Status, "Start Composing: [{}] tilesheet {}.")
            .arg(sheet.kind)
            .arg(Arg::Sheet(sheet.name.clone())),
    );
    reporter.emit(Event::new(EventKind::Composing, "{}").arg(Arg::Sheet(sheet.name.clone())));
    cancel.check()?;

    Ok(write_sheet(sheet, &sprites, settings, reporter)?)
}

/// `<output>8`, the palette copy of a sheet.
pub fn palette_copy_path(sheet: &Sheet) -> PathBuf {
    let mut path = sheet.output.clone().into_os_string();
    path.push("8");
    PathBuf::from(path)
}
