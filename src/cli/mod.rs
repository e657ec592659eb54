pub mod completions;
pub mod compose;
pub mod info;

use clap::{Parser, Subcommand};

/// tilecomp - Tileset compositor
#[derive(Parser, Debug)]
#[command(name = "tilecomp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log engine activity to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose a tileset into spritesheets and a configuration document
    Compose(compose::ComposeArgs),

    /// Show a tileset's properties and sheets
    Info(info::InfoArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
