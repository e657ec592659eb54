//! File system scanner for a sheet's source directory.
//!
//! Recursively walks the directory to find tile entry fragments (`.json`)
//! and sprites (`.png`). The walk order is made deterministic so sprite
//! indices come out the same on every run and platform.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Marker file that excludes its directory from scanning.
pub const IGNORE_FILE: &str = ".scratch";

/// What a discovered file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Json,
    Png,
}

/// Files discovered in a sheet's source directory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanResult {
    /// Tile entry fragments, in walk order.
    pub json_files: Vec<PathBuf>,
    /// Sprite files, in walk order.
    pub png_files: Vec<PathBuf>,
    /// Entries the walk could not read, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.json_files.len() + self.png_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Scan a sheet's source directory.
///
/// Directories listed in `exclude` (relative to `root`) and directories
/// holding an [`IGNORE_FILE`] are pruned before descending. Files are
/// ordered by their directory path, then by filename. A missing root
/// yields an empty result; unreadable entries are skipped and listed in
/// [`ScanResult::errors`].
pub fn scan_sheet(root: &Path, exclude: &[PathBuf]) -> ScanResult {
    let mut result = ScanResult::new();

    if !root.is_dir() {
        return result;
    }

    let excluded: HashSet<PathBuf> = exclude.iter().map(|p| root.join(p)).collect();

    let mut found: Vec<(String, String, PathBuf, FileKind)> = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_pruned(e, &excluded))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                result.errors.push((path, e.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(kind) = classify(filename) else {
            continue;
        };

        let dir_key = path
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(dir_sort_key)
            .unwrap_or_default();

        found.push((dir_key, filename.to_string(), path.to_path_buf(), kind));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    for (_, _, path, kind) in found {
        match kind {
            FileKind::Json => result.json_files.push(path),
            FileKind::Png => result.png_files.push(path),
        }
    }

    result
}

fn is_pruned(entry: &DirEntry, excluded: &HashSet<PathBuf>) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    excluded.contains(entry.path()) || entry.path().join(IGNORE_FILE).is_file()
}

/// Platform-independent directory key: components joined with `/`.
fn dir_sort_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Classify a filename by its suffixes.
///
/// The name must carry exactly one recognised suffix: `a.json` is a
/// fragment, `a.b.json` and `a.png.bak` are neither. Leading dots do not
/// start a suffix.
pub fn classify(filename: &str) -> Option<FileKind> {
    let suffixes = suffixes(filename);
    match suffixes.as_slice() {
        ["json"] => Some(FileKind::Json),
        ["png"] => Some(FileKind::Png),
        _ => None,
    }
}

/// Suffixes without their dots: `a.png.bak` gives `["png", "bak"]`.
fn suffixes(filename: &str) -> Vec<&str> {
    if filename.ends_with('.') {
        return vec![];
    }
    filename.trim_start_matches('.').split('.').skip(1).collect()
}
