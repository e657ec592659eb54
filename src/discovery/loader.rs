//! Sheet loader - turns discovered files into registry state and entries.
//!
//! Sprite filenames are registered in scan order; this is the only place
//! sprite indices are minted. JSON fragments are parsed into raw tile
//! entries.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::cancel::CancelToken;
use crate::diagnostics::{Arg, MessageKind, Reporter};
use crate::error::{Halt, Result, TileError};
use crate::registry::{Registration, SpriteRegistry};
use crate::types::{Sheet, TileEntry};

/// Load one JSON fragment: a single entry object or an array of them.
pub fn load_fragment(path: &Path) -> Result<Vec<TileEntry>> {
    let source = fs::read_to_string(path).map_err(|e| TileError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read tile entries: {}", e),
    })?;

    let value: Value = serde_json::from_str(&source).map_err(|e| TileError::Parse {
        message: format!("Error loading {}: {}", path.display(), e),
        help: Some("Fix the JSON syntax of the fragment and compose again".to_string()),
    })?;

    let entries = match value {
        Value::Array(items) => items.into_iter().map(|v| TileEntry::new(v, path)).collect(),
        other => vec![TileEntry::new(other, path)],
    };

    Ok(entries)
}

/// Parse every fragment discovered for the sheet into its tile entries.
pub fn load_sheet_json(sheet: &mut Sheet, cancel: &CancelToken) -> std::result::Result<(), Halt> {
    for path in sheet.json_files.clone() {
        cancel.check()?;
        let entries = load_fragment(&path)?;
        sheet.tile_entries.extend(entries);
    }
    Ok(())
}

/// Register the sheet's sprite basenames with the registry.
///
/// Duplicate basenames keep their first registration and are reported:
/// as an error for main sheets, as a warning for filler sheets when
/// `warn_filler_duplicates` is set. Only fresh sprites are recorded for
/// composing.
pub fn register_filenames(
    sheet: &mut Sheet,
    registry: &mut SpriteRegistry,
    reporter: &Reporter,
    warn_filler_duplicates: bool,
    cancel: &CancelToken,
) -> std::result::Result<(), Halt> {
    let category = sheet.kind.category();

    for path in &sheet.png_files {
        cancel.check()?;

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match registry.register(stem, category) {
            Registration::New(_) => sheet.sprites.push(path.clone()),
            Registration::Duplicate(_) => {
                if !sheet.is_filler() {
                    reporter.error(
                        MessageKind::DuplicateName,
                        "Duplicate root name for ID {}: {}.",
                        vec![Arg::Sprite(stem.to_string()), Arg::Path(path.clone())],
                    );
                } else if warn_filler_duplicates {
                    reporter.warning(
                        MessageKind::FillerDuplicate,
                        "Root name {} is already present in a non-filler sheet: {}",
                        vec![Arg::Sprite(stem.to_string()), Arg::Path(path.clone())],
                    );
                }
            }
        }
    }

    Ok(())
}
