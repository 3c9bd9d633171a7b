// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Dependency-ordered asset pipeline runner with incremental rebuilds.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Assetflow.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Assetflow.toml", global = true)]
    pub config: String,

    /// Build environment; `production` enables minification and image
    /// recompression stages.
    ///
    /// If omitted, `ASSETFLOW_ENV` or the config file value is used.
    #[arg(long, value_enum, value_name = "ENV", global = true)]
    pub env: Option<EnvFlag>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph and resolved patterns, but
    /// don't execute anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands map one-to-one onto task names in the registry.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the full pipeline once: styles, images, html and bundle.
    Build,
    /// Build, then watch source roots and rebuild on change while serving
    /// the output tree with live reload.
    Watch,
    /// Delete build output and generated source folders, then clear the
    /// incremental cache.
    Clean,
    /// Lint script sources against the configured rules.
    #[command(name = "lint:scripts")]
    LintScripts,
    /// Lint style sources against the configured rules.
    #[command(name = "lint:styles")]
    LintStyles,
}

impl Command {
    /// The registry task name this subcommand resolves to.
    pub fn task_name(&self) -> &'static str {
        match self {
            Command::Build => "build",
            Command::Watch => "build",
            Command::Clean => "clean",
            Command::LintScripts => "lint:scripts",
            Command::LintStyles => "lint:styles",
        }
    }
}

/// Build environment as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum EnvFlag {
    Development,
    Production,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
