use miette::Diagnostic;
use thiserror::Error;

/// Main error type for tileset composing
#[derive(Error, Diagnostic, Debug)]
pub enum TileError {
    #[error("IO error: {0}")]
    #[diagnostic(code(tilecomp::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tilecomp::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(tilecomp::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Setup error: {message}")]
    #[diagnostic(code(tilecomp::setup))]
    Setup {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Image error with {path}: {message}")]
    #[diagnostic(code(tilecomp::image))]
    Image {
        path: std::path::PathBuf,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, TileError>;

/// Why a phase stopped before completing.
///
/// Cancellation is an expected outcome and is kept apart from failures so
/// callers never report it as an error.
#[derive(Debug)]
pub enum Halt {
    Cancelled,
    Failed(TileError),
}

impl From<TileError> for Halt {
    fn from(err: TileError) -> Self {
        Halt::Failed(err)
    }
}

impl Halt {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Halt::Cancelled)
    }
}
