//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod analyze;
mod commands;
mod logging;
mod version;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use analyze::{AnalyzeArgs, SummaryArgs, handle_analyze, handle_summary};
pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::init_logging;
pub use version::display_version;

use crate::config::ConfigLoader;
use crate::diagnostics::RenderConfig;

/// Offline diagnostics for Kubernetes cluster support bundles
#[derive(Parser, Debug)]
#[command(name = "bundlediag")]
#[command(about = "Offline diagnostics for Kubernetes cluster support bundles", long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze the Cluster API clusters captured in a bundle
    Analyze(AnalyzeArgs),
    /// Print EKS Anywhere metadata for a cluster in a bundle
    Summary(SummaryArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Display version information
    Version,
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    // Before loading config so override warnings are reported
    init_logging(cli.debug, RenderConfig::from_env().color_enabled);

    let config = match &cli.command {
        // Config commands load (and report on) the file themselves
        Command::Config { .. } | Command::Version => ConfigLoader::load_defaults(),
        _ => ConfigLoader::load()?,
    };
    tracing::debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args, &config).await,
        Command::Summary(args) => handle_summary(args, &config).await,
        Command::Config { subcommand } => handle_config_command(subcommand),
        Command::Version => {
            display_version();
            Ok(())
        }
    }
}
