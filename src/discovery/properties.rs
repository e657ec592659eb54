//! Tileset properties file (`tileset.txt`).
//!
//! Simple `key: value` lines; blank lines and `#` comments are skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, TileError};

/// The name of the properties file.
pub const PROPERTIES_FILENAME: &str = "tileset.txt";

/// Key naming the output configuration document.
pub const JSON_KEY: &str = "JSON";

/// Parsed key/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pairs: BTreeMap<String, String>,
}

impl Properties {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TileError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read properties: {}", e),
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut pairs = BTreeMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| TileError::Parse {
                message: format!("Line {} of {} is not `key: value`", number + 1, PROPERTIES_FILENAME),
                help: None,
            })?;
            pairs.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Tileset display name.
    pub fn name(&self) -> Option<&str> {
        self.get("NAME")
    }

    /// Tileset view name.
    pub fn view(&self) -> Option<&str> {
        self.get("VIEW")
    }
}

/// Find the first non-empty properties file among the candidate dirs.
pub fn find_properties(candidates: &[&Path]) -> Result<(PathBuf, Properties)> {
    for dir in candidates {
        let path = dir.join(PROPERTIES_FILENAME);
        if !path.is_file() {
            continue;
        }
        let properties = Properties::load(&path)?;
        if !properties.is_empty() {
            return Ok((path, properties));
        }
    }

    Err(TileError::Setup {
        message: format!("No valid {} found", PROPERTIES_FILENAME),
        help: Some("Add a tileset.txt with a `JSON: tile_config.json` line".to_string()),
    })
}

/// Name of the output configuration document.
pub fn config_filename(properties: &Properties) -> Result<String> {
    match properties.get(JSON_KEY) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(TileError::Setup {
            message: format!("No {} key found in {}", JSON_KEY, PROPERTIES_FILENAME),
            help: None,
        }),
    }
}
