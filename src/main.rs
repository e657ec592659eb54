use clap::Parser;
use miette::Result;
use tilecomp::cli::{Cli, Commands};
use tilecomp::output::Printer;
use tilecomp::pipeline::RunOutcome;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let printer = Printer::new();
    match cli.command {
        Commands::Compose(args) => {
            if tilecomp::cli::compose::run(args, &printer, cli.verbose)? == RunOutcome::Aborted {
                return Err(miette::miette!("Composing aborted"));
            }
        }
        Commands::Info(args) => tilecomp::cli::info::run(args, &printer)?,
        Commands::Completions(args) => tilecomp::cli::completions::run(args)?,
    }

    Ok(())
}
