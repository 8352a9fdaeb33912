mod address;
mod cli;
mod commands;
mod config;
mod engine;
mod manifest;
mod provider;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

use state::StateFile;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub manifest: PathBuf,
    pub state: PathBuf,
}

impl Context {
    /// Context for a manifest, with the state file defaulting to its
    /// directory.
    pub fn for_paths(manifest: PathBuf, state: Option<PathBuf>) -> Self {
        let state = state.unwrap_or_else(|| StateFile::path_for(&manifest));
        Self {
            verbose: 0,
            quiet: false,
            manifest,
            state,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        ..Context::for_paths(cli.manifest, cli.state)
    };

    match cli.command {
        Command::Plan => commands::plan::run(&ctx),
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Refresh => commands::refresh::run(&ctx),
        Command::Destroy(args) => commands::apply::destroy(&ctx, &args),
        Command::Import { address, id } => commands::import::run(&ctx, &address, &id),
        Command::Data(cmd) => commands::data::run(&ctx, &cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "landscape-provider", &mut io::stdout());
            Ok(())
        }
    }
}
