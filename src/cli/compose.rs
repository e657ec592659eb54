//! Compose command implementation.
//!
//! Runs the pipeline on a worker thread and renders its events on the
//! calling thread as they arrive.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::Args;

use crate::diagnostics::ChannelSink;
use crate::error::{Result, TileError};
use crate::output::{display_path, EventReport, Printer};
use crate::pipeline::{ComposeFlags, ComposeOptions, Composer, RunOutcome};

/// Compose a tileset into spritesheets and a configuration document
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Tileset source directory (holds tile_info.json)
    pub source: PathBuf,

    /// Output directory (default: the source directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Add tile entries for sprites no entry references (default)
    #[arg(long, overrides_with = "no_use_all")]
    pub use_all: bool,

    /// Only report sprites no entry references
    #[arg(long, overrides_with = "use_all")]
    pub no_use_all: bool,

    /// Abort on the first warning or error
    #[arg(long)]
    pub fail_fast: bool,

    /// Warn about filler sprites and ids already provided by main sheets
    #[arg(long)]
    pub obsolete_fillers: bool,

    /// Quantize every spritesheet to a 256-colour palette
    #[arg(long)]
    pub palette: bool,

    /// Also write palette-quantized copies (<sheet>.png8)
    #[arg(long)]
    pub palette_copies: bool,

    /// Pretty-print the configuration document
    #[arg(long)]
    pub format_json: bool,

    /// Write the configuration document only, skip the images
    #[arg(long)]
    pub only_json: bool,

    /// Only compose these sheets (repeatable); all sheets are still indexed
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheets: Vec<String>,

    /// Number of sheets composed in parallel
    #[arg(long, short)]
    pub jobs: Option<usize>,
}

impl ComposeArgs {
    pub fn options(&self) -> ComposeOptions {
        let flags = ComposeFlags {
            use_all: !self.no_use_all,
            fail_fast: self.fail_fast,
            obsolete_fillers: self.obsolete_fillers,
            palette: self.palette,
            palette_copies: self.palette_copies,
            format_json: self.format_json,
            only_json: self.only_json,
        };

        let mut options = ComposeOptions::new(&self.source)
            .with_flags(flags)
            .with_subset(self.sheets.clone());
        options.output_dir = self.output.clone();
        options.jobs = self.jobs;
        options
    }
}

pub fn run(args: ComposeArgs, printer: &Printer, verbose: bool) -> Result<RunOutcome> {
    let options = args.options();
    printer.status(
        "Composing",
        &format!(
            "{} {} {}",
            display_path(&options.source_dir),
            printer.dim("->"),
            display_path(&options.output_dir())
        ),
    );

    let (sink, events) = ChannelSink::new();
    let composer = Composer::new(options, Arc::new(sink));
    let worker = thread::spawn(move || composer.run());

    // The channel closes once the worker drops the composer.
    let mut report = EventReport::new(printer, verbose);
    for event in events {
        report.observe(&event);
    }

    let outcome = worker.join().map_err(|_| TileError::Setup {
        message: "Composing thread panicked".to_string(),
        help: None,
    })?;

    report.summary();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ComposeArgs,
    }

    #[test]
    fn test_flags_map_to_options() {
        let wrapper = Wrapper::parse_from([
            "tilecomp",
            "tiles",
            "--no-use-all",
            "--format-json",
            "--sheet",
            "a.png",
            "--sheet",
            "b.png",
            "-j",
            "2",
        ]);
        let options = wrapper.args.options();

        assert_eq!(options.source_dir, PathBuf::from("tiles"));
        assert_eq!(options.output_dir(), PathBuf::from("tiles"));
        assert!(!options.flags.use_all);
        assert!(options.flags.format_json);
        assert!(!options.flags.palette);
        assert_eq!(options.subset, vec!["a.png", "b.png"]);
        assert_eq!(options.jobs, Some(2));
    }

    #[test]
    fn test_output_override() {
        let wrapper = Wrapper::parse_from(["tilecomp", "tiles", "--output", "dist"]);
        assert_eq!(wrapper.args.options().output_dir(), PathBuf::from("dist"));
        assert!(wrapper.args.options().flags.use_all);
    }

    #[test]
    fn test_last_use_all_flag_wins() {
        let wrapper = Wrapper::parse_from(["tilecomp", "tiles", "--no-use-all", "--use-all"]);
        assert!(wrapper.args.options().flags.use_all);

        let wrapper = Wrapper::parse_from(["tilecomp", "tiles", "--use-all", "--no-use-all"]);
        assert!(!wrapper.args.options().flags.use_all);
    }
}
