//! storegraph -- package store dependency graph CLI
//!
//! Thin composition root: loads configuration, installs logging, wires the
//! subprocess-backed store into the engine and maps failures to exit codes.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use storegraph_core::config::{GeneralConfig, StoreGraphConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Configuration path used when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "storegraph.toml";

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    // config 명령은 설정 오류 자체를 보고해야 하므로 로드 전에 처리
    let command = match cli.command {
        Commands::Config(args) => {
            let mut general = GeneralConfig::default();
            if let Some(level) = cli.log_level {
                general.log_level = level;
            }
            init_logging(&general)?;
            return commands::config::execute(args, &cli.config, &writer);
        }
        command => command,
    };

    let mut config = load_config(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
        config.validate()?;
    }
    init_logging(&config.general)?;
    storegraph_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "storegraph starting");

    match command {
        Commands::Graph(args) => commands::graph::execute(args, &config, &writer),
        Commands::Deps(args) => commands::deps::execute(args, &config, &writer),
        Commands::Config(_) => Ok(()),
    }
}

/// The default path is optional; an explicitly given path must exist.
fn load_config(path: &Path) -> Result<StoreGraphConfig, CliError> {
    let config = if path == Path::new(DEFAULT_CONFIG_PATH) {
        StoreGraphConfig::load_or_default(path)?
    } else {
        StoreGraphConfig::load(path)?
    };
    Ok(config)
}

fn init_logging(general: &GeneralConfig) -> Result<(), CliError> {
    logging::init_tracing(general).map_err(|e| CliError::Config(e.to_string()))
}
