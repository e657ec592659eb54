//! Tileset discovery: configuration documents and sheet source trees.
//!
//! A composing tileset directory holds `tile_info.json` (tileset defaults
//! and the ordered sheet list), `tileset.txt` (properties naming the output
//! document) and one `pngs_<stem>_<w>x<h>` subtree per sheet.
//!
//! # Example
//!
//! ```ignore
//! use tilecomp::discovery::discover;
//!
//! let project = discover("./MyTileset", "./out")?;
//! println!("{} sheets -> {}", project.info.sheets.len(), project.config_file);
//! ```

mod info;
mod loader;
mod properties;
mod scanner;

use std::path::{Path, PathBuf};

use crate::error::{Result, TileError};

pub use info::{SheetSpec, TileInfo, TilesetInfo};
pub use loader::{load_fragment, load_sheet_json, register_filenames};
pub use properties::{config_filename, find_properties, Properties, PROPERTIES_FILENAME};
pub use scanner::{classify, scan_sheet, FileKind, ScanResult, IGNORE_FILE};

/// The name of the tileset info document.
pub const INFO_FILENAME: &str = "tile_info.json";

/// Everything needed before indexing starts.
#[derive(Debug, Clone)]
pub struct Project {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub info: TilesetInfo,
    pub properties: Properties,
    /// Output configuration document filename.
    pub config_file: String,
}

impl Project {
    pub fn config_path(&self) -> PathBuf {
        self.output_dir.join(&self.config_file)
    }
}

/// Load the tileset info only (no properties lookup).
pub fn load_info(source_dir: &Path) -> Result<TilesetInfo> {
    check_source_dir(source_dir)?;

    let info_path = source_dir.join(INFO_FILENAME);
    if !info_path.is_file() {
        return Err(TileError::Setup {
            message: format!("Cannot open {}", info_path.display()),
            help: Some(format!("A tileset source directory needs a {}", INFO_FILENAME)),
        });
    }
    TilesetInfo::load(&info_path)
}

/// Validate the source tree and read its configuration documents.
///
/// The properties file is looked up in the source directory first, then
/// in the output directory.
pub fn discover(source_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<Project> {
    let source_dir = source_dir.as_ref().to_path_buf();
    let output_dir = output_dir.as_ref().to_path_buf();

    let info = load_info(&source_dir)?;
    let (_, properties) = find_properties(&[&source_dir, &output_dir])?;
    let config_file = config_filename(&properties)?;

    Ok(Project {
        source_dir,
        output_dir,
        info,
        properties,
        config_file,
    })
}

fn check_source_dir(source_dir: &Path) -> Result<()> {
    if std::fs::read_dir(source_dir).is_err() {
        return Err(TileError::Setup {
            message: format!("Cannot open directory {}", source_dir.display()),
            help: None,
        });
    }
    Ok(())
}
