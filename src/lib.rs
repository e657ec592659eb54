//! tilecomp - Tileset compositor
//!
//! A library for composing directories of sprite images and JSON tile
//! entry fragments into spritesheet PNGs and one merged tile
//! configuration document.

pub mod cancel;
pub mod cli;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod types;

pub use cancel::CancelToken;
pub use diagnostics::{Arg, ChannelSink, DiagnosticSink, Event, EventKind, EventLog, MessageKind, Reporter};
pub use discovery::{discover, Project, SheetSpec, TileInfo, TilesetInfo};
pub use error::{Halt, Result, TileError};
pub use pipeline::{AbortHandle, ComposeFlags, ComposeOptions, Composer, RunOutcome};
pub use registry::{Category, SheetKind, SpriteRegistry};
pub use resolve::Resolver;
pub use types::{Sheet, TileEntry};
