//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// storegraph -- package store dependency graphs and component inventories.
///
/// Use `storegraph <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "storegraph", version, about, long_about = None)]
pub struct Cli {
    /// Path to the storegraph.toml configuration file.
    #[arg(short, long, default_value = "storegraph.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for reports.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draw the dependency graph of a store artifact.
    Graph(GraphArgs),

    /// List the components of a closure with their direct dependencies.
    Deps(DepsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- graph ----

/// Draw the dependency graph of a store artifact as DOT or CSV.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Store path (or a symlink to one, such as `./result`).
    pub target: String,

    /// Walk build-time dependencies instead of runtime dependencies.
    #[arg(long)]
    pub buildtime: bool,

    /// Maximum traversal depth (default: `graph.default_depth`).
    #[arg(long)]
    pub depth: Option<u32>,

    /// Draw the dependents of packages whose name matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub inverse: Option<String>,

    /// Stop expanding at packages whose name matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub until: Option<String>,

    /// Highlight packages whose name matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub colorize: Option<String>,

    /// Include the store path in node labels.
    #[arg(long)]
    pub pathnames: bool,

    /// Output file; the extension selects the format (.dot or .csv).
    /// DOT goes to stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

// ---- deps ----

/// Print the component inventory of a store artifact.
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Store path (or a symlink to one, such as `./result`).
    pub target: String,

    /// Use build-time dependencies instead of runtime dependencies.
    #[arg(long, conflicts_with = "combined")]
    pub buildtime: bool,

    /// Union runtime and build-time dependencies.
    #[arg(long)]
    pub combined: bool,

    /// Only include components reachable within this many hops.
    #[arg(long)]
    pub depth: Option<u32>,
}

// ---- config ----

/// Manage storegraph configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, store, graph).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_graph_defaults() {
        let cli = Cli::try_parse_from(["storegraph", "graph", "/nix/store/abc-hello"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Graph(args) => {
                assert_eq!(args.target, "/nix/store/abc-hello");
                assert!(!args.buildtime, "buildtime should default to false");
                assert!(args.depth.is_none());
                assert!(args.out.is_none());
                assert!(!args.pathnames);
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn test_cli_parse_graph_all_flags() {
        let cli = Cli::try_parse_from([
            "storegraph",
            "graph",
            "./result",
            "--buildtime",
            "--depth",
            "3",
            "--inverse",
            "glibc",
            "--until",
            "stdenv",
            "--colorize",
            "openssl",
            "--pathnames",
            "--out",
            "graph.csv",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Graph(args) => {
                assert!(args.buildtime);
                assert_eq!(args.depth, Some(3));
                assert_eq!(args.inverse.as_deref(), Some("glibc"));
                assert_eq!(args.until.as_deref(), Some("stdenv"));
                assert_eq!(args.colorize.as_deref(), Some("openssl"));
                assert!(args.pathnames);
                assert_eq!(args.out, Some(PathBuf::from("graph.csv")));
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn test_cli_parse_graph_requires_target() {
        assert!(Cli::try_parse_from(["storegraph", "graph"]).is_err());
    }

    #[test]
    fn test_cli_parse_deps_combined() {
        let cli = Cli::try_parse_from(["storegraph", "deps", "./result", "--combined"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Deps(args) => {
                assert!(args.combined);
                assert!(!args.buildtime);
            }
            _ => panic!("expected Deps command"),
        }
    }

    #[test]
    fn test_cli_parse_deps_buildtime_conflicts_with_combined() {
        let args =
            Cli::try_parse_from(["storegraph", "deps", "./result", "--combined", "--buildtime"]);
        assert!(args.is_err(), "--buildtime and --combined are exclusive");
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["storegraph", "config", "show", "--section", "store"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section, Some("store".to_owned()));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "storegraph",
            "-c",
            "/etc/storegraph.toml",
            "--log-level",
            "debug",
            "--output",
            "json",
            "config",
            "validate",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/etc/storegraph.toml"));
        assert_eq!(cli.log_level, Some("debug".to_owned()));
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn test_cli_parse_missing_command_fails() {
        assert!(Cli::try_parse_from(["storegraph"]).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "storegraph");
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"graph"));
        assert!(subcommands.contains(&"deps"));
        assert!(subcommands.contains(&"config"));
    }
}
