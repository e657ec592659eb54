//! The merged configuration document.
//!
//! Shape: `{"tile_info": [...], "tiles-new": [<sheet blocks>, <fallback block>]}`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::diagnostics::{Arg, MessageKind, Reporter};
use crate::discovery::TileInfo;
use crate::error::{Result, TileError};
use crate::types::Sheet;

/// Default name of the synthetic fallback block's image.
pub const DEFAULT_FALLBACK: &str = "fallback.png";

/// External pretty-printer, relative to the working directory.
pub const FORMATTER_PATH: &str = "tools/json_formatter";

/// Output document root.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigDocument {
    pub tile_info: Vec<TileInfoBlock>,
    #[serde(rename = "tiles-new")]
    pub tiles_new: Vec<SheetBlock>,
}

/// Tileset-wide metadata as written to the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileInfoBlock {
    pub pixelscale: Number,
    pub width: u32,
    pub height: u32,
    pub zlevel_height: i64,
    pub iso: bool,
    pub retract_dist_min: f64,
    pub retract_dist_max: f64,
}

impl From<&TileInfo> for TileInfoBlock {
    fn from(info: &TileInfo) -> Self {
        Self {
            pixelscale: info.pixelscale.clone(),
            width: info.width,
            height: info.height,
            zlevel_height: info.zlevel_height,
            iso: info.iso,
            retract_dist_min: info.retract_dist_min,
            retract_dist_max: info.retract_dist_max,
        }
    }
}

/// One `tiles-new` element.
#[derive(Debug, Clone, Serialize)]
pub struct SheetBlock {
    pub file: String,
    #[serde(rename = "//", skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(flatten)]
    pub geometry: Option<Geometry>,
    pub tiles: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascii: Option<Vec<AsciiBlock>>,
}

impl SheetBlock {
    /// Block for a resolved sheet.
    pub fn for_sheet(sheet: &Sheet, defaults: &TileInfo) -> Self {
        Self {
            file: sheet.name.clone(),
            range: Some(format!("range {} to {}", sheet.first_index, sheet.max_index)),
            geometry: Geometry::of(sheet, defaults),
            tiles: vec![],
            ascii: None,
        }
    }

    /// The trailing fallback block, named after the configured fallback
    /// sheet if any.
    pub fn fallback(sheet: Option<&Sheet>, defaults: &TileInfo) -> Self {
        Self {
            file: sheet.map_or_else(|| DEFAULT_FALLBACK.to_string(), |s| s.name.clone()),
            range: None,
            geometry: sheet.and_then(|s| Geometry::of(s, defaults)),
            tiles: vec![],
            ascii: Some(AsciiBlock::all()),
        }
    }
}

/// Sprite geometry overrides for non-standard sheets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub sprite_offset_x: i32,
    pub sprite_offset_y: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_offset_x_retracted: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_offset_y_retracted: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixelscale: Option<f64>,
}

impl Geometry {
    /// `None` when the sheet matches the tileset defaults.
    pub fn of(sheet: &Sheet, defaults: &TileInfo) -> Option<Self> {
        if sheet.is_standard(defaults) {
            return None;
        }

        let retracted = sheet.has_retracted_offsets();
        Some(Self {
            sprite_width: sheet.sprite_width,
            sprite_height: sheet.sprite_height,
            sprite_offset_x: sheet.offset_x,
            sprite_offset_y: sheet.offset_y,
            sprite_offset_x_retracted: retracted.then_some(sheet.offset_x_retracted),
            sprite_offset_y_retracted: retracted.then_some(sheet.offset_y_retracted),
            pixelscale: (sheet.pixelscale != 1.0).then_some(sheet.pixelscale),
        })
    }
}

/// Colour block of the ascii fallback sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AsciiBlock {
    pub offset: u32,
    pub bold: bool,
    pub color: &'static str,
}

const ASCII_COLOURS: [(bool, &str); 16] = [
    (false, "BLACK"),
    (true, "WHITE"),
    (false, "WHITE"),
    (true, "BLACK"),
    (false, "RED"),
    (false, "GREEN"),
    (false, "BLUE"),
    (false, "CYAN"),
    (false, "MAGENTA"),
    (false, "YELLOW"),
    (true, "RED"),
    (true, "GREEN"),
    (true, "BLUE"),
    (true, "CYAN"),
    (true, "MAGENTA"),
    (true, "YELLOW"),
];

impl AsciiBlock {
    /// The 16 colour blocks, 256 glyphs apart.
    pub fn all() -> Vec<Self> {
        ASCII_COLOURS
            .iter()
            .enumerate()
            .map(|(i, &(bold, color))| Self {
                offset: i as u32 * 256,
                bold,
                color,
            })
            .collect()
    }
}

impl ConfigDocument {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| TileError::Parse {
            message: format!("Failed to serialize configuration: {}", e),
            help: None,
        })
    }

    /// Write the document. When `pretty` is set, the external formatter
    /// runs afterwards if present; otherwise a warning notes the fallback.
    pub fn write(&self, path: &Path, pretty: bool, reporter: &Reporter) -> Result<()> {
        let json = self.to_json(pretty)?;
        fs::write(path, json).map_err(|e| TileError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write configuration: {}", e),
        })?;

        if !pretty {
            return Ok(());
        }

        match find_formatter() {
            Some(formatter) => {
                let status = Command::new(&formatter).arg(path).status()?;
                if !status.success() {
                    tracing::warn!(formatter = %formatter.display(), %status, "formatter failed");
                }
            }
            None => reporter.warning(
                MessageKind::NoFormatter,
                "{} not found, built-in formatter was used.",
                vec![Arg::Path(PathBuf::from(FORMATTER_PATH))],
            ),
        }

        Ok(())
    }
}

fn find_formatter() -> Option<PathBuf> {
    [FORMATTER_PATH.to_string(), format!("{}.exe", FORMATTER_PATH)]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SheetSpec;
    use serde_json::json;

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
    fn test_standard_block() {
        let mut s = sheet(SheetSpec::default());
        s.first_index = 1;
        s.max_index = 16;
        let block = SheetBlock::for_sheet(&s, &TileInfo::default());

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({"file": "tiles.png", "//": "range 1 to 16", "tiles": []})
        );
    }

    #[test]
    fn test_non_standard_block() {
        let s = sheet(SheetSpec {
            sprite_width: Some(32),
            sprite_height: Some(32),
            sprite_offset_x: -8,
            sprite_offset_y_retracted: Some(4),
            pixelscale: 2.0,
            ..Default::default()
        });
        let block = SheetBlock::for_sheet(&s, &TileInfo::default());
        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(value["sprite_width"], json!(32));
        assert_eq!(value["sprite_offset_x"], json!(-8));
        assert_eq!(value["sprite_offset_x_retracted"], json!(-8));
        assert_eq!(value["sprite_offset_y_retracted"], json!(4));
        assert_eq!(value["pixelscale"], json!(2.0));
    }

    #[test]
    fn test_block_key_order() {
        let s = sheet(SheetSpec {
            sprite_offset_y: -16,
            ..Default::default()
        });
        let block = SheetBlock::for_sheet(&s, &TileInfo::default());
        let json = serde_json::to_string(&block).unwrap();

        let file = json.find("\"file\"").unwrap();
        let range = json.find("\"//\"").unwrap();
        let width = json.find("\"sprite_width\"").unwrap();
        let tiles = json.find("\"tiles\"").unwrap();
        assert!(file < range && range < width && width < tiles);
        assert!(!json.contains("retracted"));
        assert!(!json.contains("pixelscale"));
    }

    #[test]
    fn test_fallback_block() {
        let block = SheetBlock::fallback(None, &TileInfo::default());
        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(value["file"], json!(DEFAULT_FALLBACK));
        assert_eq!(value["tiles"], json!([]));
        assert!(value.get("//").is_none());
        let ascii = value["ascii"].as_array().unwrap();
        assert_eq!(ascii.len(), 16);
        assert_eq!(ascii[0], json!({"offset": 0, "bold": false, "color": "BLACK"}));
        assert_eq!(ascii[3], json!({"offset": 768, "bold": true, "color": "BLACK"}));
        assert_eq!(ascii[15], json!({"offset": 3840, "bold": true, "color": "YELLOW"}));
    }

    #[test]
    fn test_fallback_named_after_sheet() {
        let s = Sheet::new(
            "ascii.png",
            &SheetSpec {
                fallback: true,
                ..Default::default()
            },
            &TileInfo::default(),
            Path::new("/src"),
            Path::new("/out"),
        );
        let block = SheetBlock::fallback(Some(&s), &TileInfo::default());
        assert_eq!(block.file, "ascii.png");
        assert!(block.geometry.is_none());
    }

    #[test]
    fn test_document_shape() {
        let doc = ConfigDocument {
            tile_info: vec![TileInfoBlock::from(&TileInfo::default())],
            tiles_new: vec![SheetBlock::fallback(None, &TileInfo::default())],
        };
        let value: Value = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();

        assert_eq!(
            value["tile_info"],
            json!([{
                "pixelscale": 1,
                "width": 16,
                "height": 16,
                "zlevel_height": 0,
                "iso": false,
                "retract_dist_min": -1.0,
                "retract_dist_max": 1.0
            }])
        );
        assert_eq!(value["tiles-new"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_pretty_uses_two_space_indent() {
        let doc = ConfigDocument {
            tile_info: vec![],
            tiles_new: vec![],
        };
        let pretty = doc.to_json(true).unwrap();
        assert!(pretty.contains("\n  \"tile_info\""));
    }
}
