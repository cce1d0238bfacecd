//! Telekit CLI - inspect plugins and run the tools they contribute.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use telekit_config::{Config, LoadedConfig};
use telekit_telemetry::{LogConfig, setup_logging};

mod commands;
mod theme;

use theme::Theme;

/// Telekit - plugin host for everyday tools
#[derive(Parser)]
#[command(name = "telekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to an extra configuration file
    #[arg(short, long, global = true, env = "TELEKIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect plugin descriptors
    Plugins {
        #[command(subcommand)]
        command: PluginCommands,
    },

    /// List and run tools contributed by plugins
    Tools {
        #[command(subcommand)]
        command: ToolCommands,
    },

    /// Boot every plugin and report its state
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show where configuration is read from
    Config,
}

#[derive(Subcommand)]
enum PluginCommands {
    /// List descriptors in the plugins directory
    List {
        /// Directory to scan instead of the configured one
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a single descriptor file
    Check {
        /// Path to a `plugin.toml`
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ToolCommands {
    /// List available tools
    List {
        /// Only show tools whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Run a tool on some input
    Run {
        /// Tool name (case-insensitive)
        name: String,

        /// Input text
        input: String,
    },
}

fn init_logging(loaded: &LoadedConfig, verbose: bool) {
    let config = match LogConfig::try_from(&loaded.config.logging) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", Theme::warning(&format!("Ignoring logging config: {e}")));
            LogConfig::default()
        },
    };
    let config = if verbose {
        LogConfig {
            level: "debug".to_owned(),
            ..config
        }
    } else {
        config
    };
    if let Err(e) = setup_logging(&config) {
        eprintln!("{}", Theme::warning(&format!("Logging disabled: {e}")));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load(cli.config.as_deref())?;
    init_logging(&loaded, cli.verbose);

    match cli.command {
        Commands::Plugins { command } => match command {
            PluginCommands::List { dir, json } => {
                commands::plugins::list(&loaded.config, dir, json)?;
            },
            PluginCommands::Check { file } => commands::plugins::check(&loaded.config, &file)?,
        },
        Commands::Tools { command } => match command {
            ToolCommands::List { filter } => {
                commands::tools::list(&loaded.config, filter.as_deref()).await?;
            },
            ToolCommands::Run { name, input } => {
                commands::tools::run(&loaded.config, &name, &input).await?;
            },
        },
        Commands::Status { json } => commands::status::show(&loaded.config, json).await?,
        Commands::Config => commands::status::config_paths(&loaded),
    }

    Ok(())
}
