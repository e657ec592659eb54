//! Terminal output formatting for the tilecomp CLI.
//!
//! Provides Cargo-style status output with right-aligned coloured verbs.
//! All status output goes to stderr; stdout is reserved for machine-readable output.

use std::io::{self, IsTerminal, Write};

use crate::diagnostics::{Arg, Event, EventKind, MessageKind};

/// ANSI escape codes.
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Width for right-aligned verb column.
const VERB_WIDTH: usize = 12;

/// Terminal-aware status printer.
///
/// Prints Cargo-style status lines to stderr with optional ANSI colours.
/// Colour is enabled when stderr is a terminal.
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    /// Print a status line with a green bold verb.
    /// e.g. "   Composing tiles.png"
    pub fn status(&self, verb: &str, message: &str) {
        self.print_line(GREEN, verb, message);
    }

    /// Print an informational line with a cyan bold verb.
    pub fn info(&self, verb: &str, message: &str) {
        self.print_line(CYAN, verb, message);
    }

    /// Print a warning line with a yellow bold verb.
    pub fn warning(&self, verb: &str, message: &str) {
        self.print_line(YELLOW, verb, message);
    }

    /// Print an error line with a red bold verb.
    pub fn error(&self, verb: &str, message: &str) {
        self.print_line(RED, verb, message);
    }

    /// Format a string as dim/grey.
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Format a string as bold.
    pub fn bold(&self, text: &str) -> String {
        if self.color {
            format!("{BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_line(&self, color: &str, verb: &str, message: &str) {
        let mut stderr = io::stderr().lock();
        if self.color {
            let _ = writeln!(
                stderr,
                "{BOLD}{color}{verb:>VERB_WIDTH$}{RESET} {message}"
            );
        } else {
            let _ = writeln!(stderr, "{verb:>VERB_WIDTH$} {message}");
        }
    }
}

/// Renders diagnostic events as they arrive and keeps the numbers for
/// the closing summary.
pub struct EventReport<'a> {
    printer: &'a Printer,
    verbose: bool,
    pub warnings: usize,
    pub errors: usize,
    pub unreferenced: usize,
    pub wrong_size: usize,
    pub sprites_total: usize,
    pub sprites_loaded: usize,
}

impl<'a> EventReport<'a> {
    pub fn new(printer: &'a Printer, verbose: bool) -> Self {
        Self {
            printer,
            verbose,
            warnings: 0,
            errors: 0,
            unreferenced: 0,
            wrong_size: 0,
            sprites_total: 0,
            sprites_loaded: 0,
        }
    }

    /// Count and print one event.
    pub fn observe(&mut self, event: &Event) {
        self.count(event);

        let message = event.render();
        match event.kind {
            EventKind::Warning => self.printer.warning("warning", &message),
            EventKind::Error => self.printer.error("error", &message),
            EventKind::Critical => self.printer.error("critical", &message),
            EventKind::Loading => self.printer.status("Loading", &first_arg(event)),
            EventKind::Composing => self.printer.status("Composing", &first_arg(event)),
            EventKind::Finished => self.printer.status("Finished", &message),
            EventKind::Status if self.verbose => self.printer.info("Status", &message),
            EventKind::ProgressCount if self.verbose => {
                self.printer.info("Sprites", &plural(self.sprites_total, "sprite", "sprites"))
            }
            _ => {}
        }
    }

    fn count(&mut self, event: &Event) {
        match event.kind {
            EventKind::Warning => self.warnings += 1,
            EventKind::Error | EventKind::Critical => self.errors += 1,
            EventKind::ProgressCount => {
                if let Some(Arg::Number(n)) = event.args.first() {
                    self.sprites_total = usize::try_from(*n).unwrap_or(0);
                }
            }
            EventKind::ProgressImage => self.sprites_loaded += 1,
            _ => {}
        }

        match event.class {
            Some(MessageKind::SpriteUnreferenced) | Some(MessageKind::NotUsed) => {
                self.unreferenced += 1
            }
            Some(MessageKind::SpriteSize) => self.wrong_size += 1,
            _ => {}
        }
    }

    /// Print counts and hints after the run.
    pub fn summary(&self) {
        if self.sprites_loaded > 0 {
            self.printer.info(
                "Loaded",
                &format!("{} of {}", self.sprites_loaded, plural(self.sprites_total, "sprite", "sprites")),
            );
        }

        if self.warnings == 0 && self.errors == 0 {
            return;
        }

        let counts = format!(
            "{}, {}",
            plural(self.errors, "error", "errors"),
            plural(self.warnings, "warning", "warnings")
        );
        if self.errors > 0 {
            self.printer.error("Summary", &counts);
        } else {
            self.printer.warning("Summary", &counts);
        }

        if self.unreferenced > 0 {
            self.printer.info(
                "hint",
                &self.printer.dim(&format!(
                    "{} without tile entries; compose with --use-all to add them",
                    plural(self.unreferenced, "sprite", "sprites")
                )),
            );
        }
        if self.wrong_size > 0 {
            self.printer.info(
                "hint",
                &self.printer.dim(&format!(
                    "{} of the wrong size; resize them to the sheet's sprite dimensions",
                    plural(self.wrong_size, "sprite", "sprites")
                )),
            );
        }
    }
}

fn first_arg(event: &Event) -> String {
    event
        .args
        .first()
        .map(|a| a.to_string())
        .unwrap_or_default()
}

/// Pluralize a count: `plural(1, "sheet", "sheets")` → "1 sheet".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, pluralized)
    }
}

/// Return a relative display path when possible, absolute otherwise.
pub fn display_path(path: &std::path::Path) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        if let Ok(relative) = path.strip_prefix(&cwd) {
            let s = relative.display().to_string();
            if s.is_empty() {
                return ".".to_string();
            }
            return s;
        }
    }
    path.display().to_string()
}
