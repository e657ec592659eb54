//! Tileset info document (`tile_info.json`) parsing.
//!
//! The document is a JSON array. Element 0 holds tileset-wide defaults;
//! every following element is a single-key object mapping a sheet's
//! output filename to its overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::error::{Result, TileError};

/// Tileset-wide defaults from element 0.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TileInfo {
    pub width: u32,
    pub height: u32,
    pub zlevel_height: i64,
    /// Kept as a JSON number so integers stay integers in the output.
    pub pixelscale: Number,
    pub iso: bool,
    pub retract_dist_min: f64,
    pub retract_dist_max: f64,
}

impl Default for TileInfo {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            zlevel_height: 0,
            pixelscale: Number::from(1),
            iso: false,
            retract_dist_min: -1.0,
            retract_dist_max: 1.0,
        }
    }
}

/// Per-sheet overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SheetSpec {
    pub sprite_width: Option<u32>,
    pub sprite_height: Option<u32>,
    pub sprite_offset_x: i32,
    pub sprite_offset_y: i32,
    pub sprite_offset_x_retracted: Option<i32>,
    pub sprite_offset_y_retracted: Option<i32>,
    pub pixelscale: f64,
    pub sprites_across: u32,
    pub exclude: Vec<PathBuf>,
    pub filler: bool,
    pub fallback: bool,
}

impl Default for SheetSpec {
    fn default() -> Self {
        Self {
            sprite_width: None,
            sprite_height: None,
            sprite_offset_x: 0,
            sprite_offset_y: 0,
            sprite_offset_x_retracted: None,
            sprite_offset_y_retracted: None,
            pixelscale: 1.0,
            sprites_across: 16,
            exclude: vec![],
            filler: false,
            fallback: false,
        }
    }
}

/// Parsed info document.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetInfo {
    pub tile_info: TileInfo,
    /// Sheets in configured order.
    pub sheets: Vec<(String, SheetSpec)>,
}

impl TilesetInfo {
    /// Load the info document from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TileError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read tileset info: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse the info document from a JSON string.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: Vec<Value> = serde_json::from_str(content).map_err(|e| TileError::Parse {
            message: format!("Invalid tileset info: {}", e),
            help: Some("tile_info.json must be a JSON array".to_string()),
        })?;

        let mut elements = raw.into_iter();
        let tile_info = match elements.next() {
            Some(first) => serde_json::from_value(first).map_err(|e| TileError::Parse {
                message: format!("Invalid tileset defaults: {}", e),
                help: None,
            })?,
            None => {
                return Err(TileError::Parse {
                    message: "Tileset info is empty".to_string(),
                    help: Some("The first element must hold the tileset defaults".to_string()),
                })
            }
        };

        let mut sheets = Vec::new();
        for element in elements {
            sheets.push(parse_sheet(element)?);
        }

        Ok(Self { tile_info, sheets })
    }

    /// Names of all configured sheets, in order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }
}

fn parse_sheet(element: Value) -> Result<(String, SheetSpec)> {
    let Value::Object(map) = element else {
        return Err(TileError::Parse {
            message: format!("Sheet entry must be an object, got {}", element),
            help: None,
        });
    };

    let mut entries = map.into_iter();
    let (name, spec) = match (entries.next(), entries.next()) {
        (Some(pair), None) => pair,
        _ => {
            return Err(TileError::Parse {
                message: "Sheet entry must have exactly one key".to_string(),
                help: Some(r#"Use {"tiles.png": { ... }}"#.to_string()),
            })
        }
    };

    let spec: SheetSpec = serde_json::from_value(spec).map_err(|e| TileError::Parse {
        message: format!("Invalid settings for sheet {}: {}", name, e),
        help: None,
    })?;

    if spec.sprites_across == 0 {
        return Err(TileError::Parse {
            message: format!("Sheet {} has sprites_across 0", name),
            help: Some("sprites_across must be at least 1".to_string()),
        });
    }

    Ok((name, spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let info = TilesetInfo::parse(r#"[{}]"#).unwrap();
        assert_eq!(info.tile_info, TileInfo::default());
        assert!(info.sheets.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let info = TilesetInfo::parse(
            r#"[
                {"width": 32, "height": 32, "iso": true, "pixelscale": 2, "zlevel_height": 10},
                {"tiles.png": {}},
                {"large.png": {"sprite_width": 64, "sprite_height": 64, "sprite_offset_x": -16}},
                {"filler.png": {"filler": true, "sprites_across": 8, "exclude": ["old"]}},
                {"fallback.png": {"fallback": true}}
            ]"#,
        )
        .unwrap();

        assert_eq!(info.tile_info.width, 32);
        assert!(info.tile_info.iso);
        assert_eq!(info.tile_info.pixelscale, Number::from(2));
        assert_eq!(info.tile_info.retract_dist_min, -1.0);

        let names: Vec<_> = info.sheet_names().collect();
        assert_eq!(names, vec!["tiles.png", "large.png", "filler.png", "fallback.png"]);

        let large = &info.sheets[1].1;
        assert_eq!(large.sprite_width, Some(64));
        assert_eq!(large.sprite_offset_x, -16);
        assert_eq!(large.sprites_across, 16);

        let filler = &info.sheets[2].1;
        assert!(filler.filler);
        assert_eq!(filler.exclude, vec![PathBuf::from("old")]);
    }

    #[test]
    fn test_parse_empty_array_fails() {
        assert!(TilesetInfo::parse("[]").is_err());
    }

    #[test]
    fn test_parse_not_array_fails() {
        assert!(TilesetInfo::parse(r#"{"width": 16}"#).is_err());
    }

    #[test]
    fn test_parse_multi_key_sheet_fails() {
        assert!(TilesetInfo::parse(r#"[{}, {"a.png": {}, "b.png": {}}]"#).is_err());
    }

    #[test]
    fn test_parse_zero_across_fails() {
        assert!(TilesetInfo::parse(r#"[{}, {"a.png": {"sprites_across": 0}}]"#).is_err());
    }
}
