//! Structured diagnostic events.
//!
//! An event is a kind, a message template with `{}` placeholders, the
//! ordered typed arguments for those placeholders and an optional
//! classification. Turning it into text is left to [`Event::render`] or
//! to whichever observer receives it.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use crate::registry::SheetKind;

/// What an event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProgressPercent,
    ProgressCount,
    ProgressImage,
    Status,
    Loading,
    Composing,
    Finished,
    Warning,
    Error,
    Critical,
}

impl EventKind {
    /// Whether the event reports a problem.
    pub fn is_issue(&self) -> bool {
        matches!(self, EventKind::Warning | EventKind::Error | EventKind::Critical)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::ProgressPercent => "progress",
            EventKind::ProgressCount => "count",
            EventKind::ProgressImage => "image",
            EventKind::Status => "status",
            EventKind::Loading => "loading",
            EventKind::Composing => "composing",
            EventKind::Finished => "finished",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
            EventKind::Critical => "critical",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Finer classification of warning, error and critical events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    CritGeneric,
    CritJsonLoad,
    SpriteNotFound,
    SpriteSize,
    DuplicateName,
    DuplicateId,
    NotUsed,
    ImageDecode,
    ScanFailed,
    SpriteUnreferenced,
    NoFormatter,
    NotMentioned,
    EmptyEntry,
    FillerSkip,
    FillerDuplicate,
    FillerUnused,
}

impl MessageKind {
    /// Machine-readable code (e.g. "tilecomp::duplicate-id").
    pub fn code(&self) -> &'static str {
        match self {
            MessageKind::CritGeneric => "tilecomp::critical",
            MessageKind::CritJsonLoad => "tilecomp::json-load",
            MessageKind::SpriteNotFound => "tilecomp::sprite-not-found",
            MessageKind::SpriteSize => "tilecomp::sprite-size",
            MessageKind::DuplicateName => "tilecomp::duplicate-name",
            MessageKind::DuplicateId => "tilecomp::duplicate-id",
            MessageKind::NotUsed => "tilecomp::not-used",
            MessageKind::ImageDecode => "tilecomp::image-decode",
            MessageKind::ScanFailed => "tilecomp::scan-failed",
            MessageKind::SpriteUnreferenced => "tilecomp::sprite-unreferenced",
            MessageKind::NoFormatter => "tilecomp::no-formatter",
            MessageKind::NotMentioned => "tilecomp::not-mentioned",
            MessageKind::EmptyEntry => "tilecomp::empty-entry",
            MessageKind::FillerSkip => "tilecomp::filler-skip",
            MessageKind::FillerDuplicate => "tilecomp::filler-duplicate",
            MessageKind::FillerUnused => "tilecomp::filler-unused",
        }
    }
}

/// A typed placeholder argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Path(PathBuf),
    Number(i64),
    Sprite(String),
    Id(String),
    Sheet(String),
    Kind(SheetKind),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(s) | Arg::Sprite(s) | Arg::Id(s) | Arg::Sheet(s) => write!(f, "{}", s),
            Arg::Path(p) => write!(f, "{}", p.display()),
            Arg::Number(n) => write!(f, "{}", n),
            Arg::Kind(k) => write!(f, "{}", k),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

impl From<PathBuf> for Arg {
    fn from(p: PathBuf) -> Self {
        Arg::Path(p)
    }
}

impl From<&std::path::Path> for Arg {
    fn from(p: &std::path::Path) -> Self {
        Arg::Path(p.to_path_buf())
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Number(n)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Number(n as i64)
    }
}

impl From<usize> for Arg {
    fn from(n: usize) -> Self {
        Arg::Number(n as i64)
    }
}

impl From<SheetKind> for Arg {
    fn from(k: SheetKind) -> Self {
        Arg::Kind(k)
    }
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub template: Cow<'static, str>,
    pub args: Vec<Arg>,
    pub class: Option<MessageKind>,
}

impl Event {
    pub fn new(kind: EventKind, template: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            template: template.into(),
            args: Vec::new(),
            class: None,
        }
    }

    /// Append a placeholder argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn classified(mut self, class: MessageKind) -> Self {
        self.class = Some(class);
        self
    }

    /// Substitute the arguments into the template in order.
    ///
    /// Surplus placeholders are kept verbatim; surplus arguments are dropped.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.template.len() + 16 * self.args.len());
        let mut args = self.args.iter();
        let mut rest: &str = &self.template;

        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
