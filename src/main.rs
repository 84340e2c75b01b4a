mod cli;
mod commands;
mod config;
mod interrogator;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

use config::Config;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Config,
    /// Default repository root for template paths
    pub repository: PathBuf,
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

    if let Command::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "stencil", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load()?;
    let repository = config.repository_root(cli.repository.as_deref())?;
    log::debug!("Repository root: {}", repository.display());

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
        repository,
    };

    match cli.command {
        Command::New(args) => commands::new::run(&ctx, &args),
        Command::Snap(args) => commands::snap::run(&ctx, &args),
        Command::List(args) => commands::list::run(&ctx, &args),
        Command::Info { address } => commands::info::run(&ctx, &address),
        Command::Edit(args) => commands::edit::run(&ctx, &args),
        Command::Exec(args) => commands::exec::run(&ctx, &args),
        Command::Completions { .. } => Ok(()),
    }
}
