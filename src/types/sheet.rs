//! Sheet definition and run state.

use std::path::{Path, PathBuf};

use crate::discovery::{SheetSpec, TileInfo};
use crate::registry::SheetKind;

use super::entry::TileEntry;

/// One output spritesheet and its source subtree.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Output filename, e.g. `tiles.png`.
    pub name: String,
    pub kind: SheetKind,

    pub sprite_width: u32,
    pub sprite_height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub offset_x_retracted: i32,
    pub offset_y_retracted: i32,
    pub pixelscale: f64,
    /// Grid width in sprites.
    pub sprites_across: u32,
    pub exclude: Vec<PathBuf>,

    /// Source subdirectory (`pngs_<stem>_<w>x<h>`).
    pub source_dir: PathBuf,
    /// Output image path.
    pub output: PathBuf,

    /// First index owned by this sheet.
    pub first_index: u32,
    /// Last index owned by this sheet, grid padding included.
    pub max_index: u32,
    /// Whether the reserved placeholder occupies this sheet's first cell.
    pub has_placeholder: bool,

    pub json_files: Vec<PathBuf>,
    pub png_files: Vec<PathBuf>,
    /// Sprites that received a fresh index, in index order.
    pub sprites: Vec<PathBuf>,
    pub tile_entries: Vec<TileEntry>,
}

impl Sheet {
    pub fn new(
        name: &str,
        spec: &SheetSpec,
        defaults: &TileInfo,
        source_root: &Path,
        output_root: &Path,
    ) -> Self {
        let sprite_width = spec.sprite_width.unwrap_or(defaults.width);
        let sprite_height = spec.sprite_height.unwrap_or(defaults.height);

        let stem = name.split(".png").next().unwrap_or(name);
        let dir_name = format!("pngs_{}_{}x{}", stem, sprite_width, sprite_height);

        Self {
            name: name.to_string(),
            kind: SheetKind::from_flags(spec.filler, spec.fallback),
            sprite_width,
            sprite_height,
            offset_x: spec.sprite_offset_x,
            offset_y: spec.sprite_offset_y,
            offset_x_retracted: spec.sprite_offset_x_retracted.unwrap_or(spec.sprite_offset_x),
            offset_y_retracted: spec.sprite_offset_y_retracted.unwrap_or(spec.sprite_offset_y),
            pixelscale: spec.pixelscale,
            sprites_across: spec.sprites_across.max(1),
            exclude: spec.exclude.clone(),
            source_dir: source_root.join(dir_name),
            output: output_root.join(name),
            first_index: 0,
            max_index: 0,
            has_placeholder: false,
            json_files: vec![],
            png_files: vec![],
            sprites: vec![],
            tile_entries: vec![],
        }
    }

    pub fn is_filler(&self) -> bool {
        self.kind == SheetKind::Filler
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == SheetKind::Fallback
    }

    /// Whether the sheet needs geometry overrides in the output document.
    pub fn is_standard(&self, defaults: &TileInfo) -> bool {
        self.offset_x == 0
            && self.offset_y == 0
            && !self.has_retracted_offsets()
            && self.sprite_width == defaults.width
            && self.sprite_height == defaults.height
            && self.pixelscale == 1.0
    }

    pub fn has_retracted_offsets(&self) -> bool {
        self.offset_x_retracted != self.offset_x || self.offset_y_retracted != self.offset_y
    }

    /// Whether `index` falls in this sheet's range.
    pub fn owns(&self, index: u32) -> bool {
        self.first_index <= index && index <= self.max_index
    }

    /// Number of grid cells this sheet's image holds.
    pub fn cell_count(&self) -> usize {
        self.sprites.len() + usize::from(self.has_placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(spec: SheetSpec) -> Sheet {
        Sheet::new(
            "tiles.png",
            &spec,
            &TileInfo::default(),
            Path::new("/src"),
            Path::new("/out"),
        )
    }

    #[test]
    fn test_inherits_defaults() {
        let s = sheet(SheetSpec::default());
        assert_eq!((s.sprite_width, s.sprite_height), (16, 16));
        assert_eq!(s.source_dir, PathBuf::from("/src/pngs_tiles_16x16"));
        assert_eq!(s.output, PathBuf::from("/out/tiles.png"));
        assert_eq!(s.kind, SheetKind::Main);
        assert!(s.is_standard(&TileInfo::default()));
    }

    #[test]
    fn test_overrides_make_non_standard() {
        let s = sheet(SheetSpec {
            sprite_width: Some(32),
            sprite_height: Some(64),
            sprite_offset_y: -32,
            ..Default::default()
        });
        assert_eq!(s.source_dir, PathBuf::from("/src/pngs_tiles_32x64"));
        assert_eq!(s.offset_y_retracted, -32);
        assert!(!s.has_retracted_offsets());
        assert!(!s.is_standard(&TileInfo::default()));
    }

    #[test]
    fn test_retracted_offsets() {
        let s = sheet(SheetSpec {
            sprite_offset_y_retracted: Some(-8),
            ..Default::default()
        });
        assert!(s.has_retracted_offsets());
        assert!(!s.is_standard(&TileInfo::default()));
    }

    #[test]
    fn test_owns_range() {
        let mut s = sheet(SheetSpec::default());
        s.first_index = 5;
        s.max_index = 8;
        assert!(s.owns(5));
        assert!(s.owns(8));
        assert!(!s.owns(4));
        assert!(!s.owns(9));
    }
}
