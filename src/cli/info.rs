//! Info command implementation.
//!
//! Reads a tileset's configuration documents and prints its sheets
//! without scanning or composing anything.

use std::path::PathBuf;

use clap::Args;

use crate::discovery::{config_filename, find_properties, load_info};
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::types::Sheet;

/// Show a tileset's properties and sheets
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Tileset source directory (holds tile_info.json)
    pub source: PathBuf,
}

pub fn run(args: InfoArgs, printer: &Printer) -> Result<()> {
    let info = load_info(&args.source)?;

    match find_properties(&[&args.source]) {
        Ok((_, properties)) => {
            if let Some(name) = properties.name() {
                printer.info("Name", name);
            }
            if let Some(view) = properties.view() {
                printer.info("View", view);
            }
            match config_filename(&properties) {
                Ok(file) => printer.info("Config", &file),
                Err(e) => printer.warning("warning", &e.to_string()),
            }
        }
        Err(e) => printer.warning("warning", &e.to_string()),
    }

    let defaults = &info.tile_info;
    printer.info(
        "Sprites",
        &format!("{}x{} by default", defaults.width, defaults.height),
    );

    for (name, spec) in &info.sheets {
        let sheet = Sheet::new(name, spec, defaults, &args.source, &args.source);
        let source = if sheet.source_dir.is_dir() {
            display_path(&sheet.source_dir)
        } else {
            printer.dim(&format!("{} (missing)", display_path(&sheet.source_dir)))
        };
        println!(
            "{:<24} {:<9} {:>3}x{:<3} {}",
            sheet.name,
            sheet.kind.name(),
            sheet.sprite_width,
            sheet.sprite_height,
            source
        );
    }

    printer.status("Found", &plural(info.sheets.len(), "sheet", "sheets"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_info_on_tileset() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tile_info.json"),
            r#"[{"width": 32, "height": 32}, {"tiles.png": {}}, {"fallback.png": {"fallback": true}}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("tileset.txt"), "NAME: test\nJSON: tile_config.json\n").unwrap();
        fs::create_dir(dir.path().join("pngs_tiles_32x32")).unwrap();

        let args = InfoArgs {
            source: dir.path().to_path_buf(),
        };
        assert!(run(args, &Printer::new()).is_ok());
    }

    #[test]
    fn test_info_missing_directory() {
        let args = InfoArgs {
            source: PathBuf::from("/nonexistent/tileset"),
        };
        assert!(run(args, &Printer::new()).is_err());
    }
}
