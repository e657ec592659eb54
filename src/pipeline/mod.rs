//! The composing pipeline.
//!
//! A run walks four phases in order: initializing (configuration
//! documents), indexing (scan and register every sheet), merging (resolve
//! tile entries and write the configuration document) and composing
//! (assemble and encode the selected sheets in parallel).
//!
//! Progress and problems are reported through the [`Reporter`]; a run ends
//! with exactly one `Finished` event unless it failed fatally.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilecomp::diagnostics::EventLog;
//! use tilecomp::pipeline::{ComposeOptions, Composer};
//!
//! let log = Arc::new(EventLog::new());
//! let outcome = Composer::new(ComposeOptions::new("./MyTileset"), log.clone()).run()?;
//! ```

mod compose;
mod document;
mod phases;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::diagnostics::{Arg, DiagnosticSink, Event, EventKind, MessageKind, Reporter};
use crate::discovery;
use crate::error::{Halt, Result, TileError};

pub use compose::{compose_sheet, load_sheet_sprites, palette_copy_path, write_sheet, ImageSettings};
pub use document::{AsciiBlock, ConfigDocument, Geometry, SheetBlock, TileInfoBlock, DEFAULT_FALLBACK};
pub use phases::{Indexed, Initialized, Merged};

/// Behaviour switches of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeFlags {
    /// Synthesize entries for sprites no tile entry references.
    pub use_all: bool,
    /// Abort on the first warning or error.
    pub fail_fast: bool,
    /// Warn about filler sprites and ids shadowed by main sheets.
    pub obsolete_fillers: bool,
    /// Quantize every sheet to a palette.
    pub palette: bool,
    /// Also write palette-quantized copies.
    pub palette_copies: bool,
    /// Pretty-print the configuration document.
    pub format_json: bool,
    /// Write the configuration document only.
    pub only_json: bool,
}

impl Default for ComposeFlags {
    fn default() -> Self {
        Self {
            use_all: true,
            fail_fast: false,
            obsolete_fillers: false,
            palette: false,
            palette_copies: false,
            format_json: false,
            only_json: false,
        }
    }
}

/// Everything a run needs from its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    pub source_dir: PathBuf,
    /// Defaults to the source directory.
    pub output_dir: Option<PathBuf>,
    pub flags: ComposeFlags,
    /// Sheets to compose; empty means all. Other sheets are still indexed.
    pub subset: Vec<String>,
    /// Worker count; defaults to the available parallelism.
    pub jobs: Option<usize>,
}

impl ComposeOptions {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: None,
            flags: ComposeFlags::default(),
            subset: vec![],
            jobs: None,
        }
    }

    pub fn with_output(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_flags(mut self, flags: ComposeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_subset(mut self, subset: Vec<String>) -> Self {
        self.subset = subset;
        self
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.source_dir.clone())
    }

    fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Aborted,
}

/// Lets another thread stop a running composer.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    reporter: Reporter,
}

impl AbortHandle {
    /// Request a cooperative stop. A user request is also noted as a
    /// critical event.
    pub fn request_abort(&self, by_user: bool) {
        if by_user {
            self.reporter.critical(
                MessageKind::CritGeneric,
                "User Request: {}...",
                vec![Arg::from("Aborting")],
            );
        }
        self.reporter.request_abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.reporter.cancel_token().is_cancelled()
    }
}

/// Drives one composing run.
#[derive(Debug)]
pub struct Composer {
    options: ComposeOptions,
    reporter: Reporter,
}

impl Composer {
    pub fn new(options: ComposeOptions, sink: Arc<dyn DiagnosticSink>) -> Self {
        let reporter = Reporter::new(sink, CancelToken::new()).with_fail_fast(options.flags.fail_fast);
        Self { options, reporter }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            reporter: self.reporter.clone(),
        }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Run every phase.
    ///
    /// Cancellation, by request or by the fail-fast mode, ends with
    /// `Ok(RunOutcome::Aborted)`. Fatal setup conditions are reported as
    /// one critical event and returned as errors.
    pub fn run(&self) -> Result<RunOutcome> {
        match self.run_phases() {
            Ok(()) => {
                self.finish("Composing done.");
                Ok(RunOutcome::Finished)
            }
            Err(Halt::Cancelled) => {
                self.finish("Composing aborted.");
                Ok(RunOutcome::Aborted)
            }
            Err(Halt::Failed(err)) => {
                let class = match err {
                    TileError::Parse { .. } => MessageKind::CritJsonLoad,
                    _ => MessageKind::CritGeneric,
                };
                self.reporter.critical(
                    class,
                    "{}. {}...",
                    vec![Arg::Text(err.to_string()), Arg::from("Auto-Aborting")],
                );
                Err(err)
            }
        }
    }

    fn run_phases(&self) -> std::result::Result<(), Halt> {
        let reporter = &self.reporter;
        let cancel = reporter.cancel_token();
        let flags = &self.options.flags;

        // Phase 1: configuration
        let project = discovery::discover(&self.options.source_dir, self.options.output_dir())?;
        tracing::info!(
            source = %project.source_dir.display(),
            output = %project.output_dir.display(),
            config = %project.config_file,
            "composing tileset"
        );

        // Phase 2: scan and register
        let indexed = Initialized::new(project).index(flags, reporter, cancel)?;

        // Phase 3: resolve and write the configuration document
        let merged = indexed.merge(flags, reporter, cancel)?;

        let counts = merged.sprite_counts(&self.options.subset);
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        let mut event = Event::new(EventKind::ProgressCount, "{}").arg(total);
        for (name, count) in counts {
            event = event.arg(Arg::Sheet(name)).arg(count);
        }
        reporter.emit(event);

        // Phase 4: images
        if flags.only_json {
            return Ok(());
        }
        let settings = ImageSettings {
            palette: flags.palette,
            palette_copies: flags.palette_copies,
        };
        merged.compose(&self.options.subset, self.options.jobs(), settings, reporter, cancel)
    }

    fn finish(&self, message: &'static str) {
        self.reporter.emit(Event::new(EventKind::Finished, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::EventLog;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_flags_use_all() {
        let flags = ComposeFlags::default();
        assert!(flags.use_all);
        assert!(!flags.only_json);
    }

    #[test]
    fn test_output_defaults_to_source() {
        let options = ComposeOptions::new("/tiles");
        assert_eq!(options.output_dir(), PathBuf::from("/tiles"));
        assert_eq!(options.with_output("/out").output_dir(), PathBuf::from("/out"));
    }

    #[test]
    fn test_fatal_setup_emits_one_critical() {
        let log = Arc::new(EventLog::new());
        let composer = Composer::new(ComposeOptions::new("/nonexistent/tileset"), log.clone());

        assert!(composer.run().is_err());
        assert_eq!(log.count(EventKind::Critical), 1);
        assert_eq!(log.count(EventKind::Finished), 0);
        assert!(log.events()[0].render().ends_with("Auto-Aborting..."));
    }

    #[test]
    fn test_abort_before_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tile_info.json"), r#"[{}, {"tiles.png": {}}]"#).unwrap();
        fs::write(dir.path().join("tileset.txt"), "JSON: tile_config.json\n").unwrap();

        let log = Arc::new(EventLog::new());
        let composer = Composer::new(ComposeOptions::new(dir.path()), log.clone());
        let handle = composer.abort_handle();
        handle.request_abort(true);
        assert!(handle.is_aborted());

        assert_eq!(composer.run().unwrap(), RunOutcome::Aborted);
        let last = log.events().pop().unwrap();
        assert_eq!(last.kind, EventKind::Finished);
        assert_eq!(last.render(), "Composing aborted.");
        assert!(!dir.path().join("tile_config.json").exists());
    }
}
