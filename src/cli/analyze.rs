//! Bundle command handlers

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::bundle::Bundle;
use crate::config::Config;
use crate::diagnostics::{
    ClusterAnalysisResult, ClusterAnalyzer, Printer, RenderConfig, cluster_metadata, find_cluster,
};

/// Arguments of `bundlediag analyze`
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Bundle directory or .tar.gz archive
    pub bundle: PathBuf,

    /// Only analyze this cluster
    #[arg(long)]
    pub cluster: Option<String>,

    /// Namespace of the cluster given with --cluster
    #[arg(long, requires = "cluster")]
    pub namespace: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the results as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `bundlediag summary`
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Bundle directory or .tar.gz archive
    pub bundle: PathBuf,

    /// EKS Anywhere cluster name
    #[arg(long)]
    pub cluster: String,

    /// Namespace of the EKS Anywhere cluster
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

fn render_config(config: &Config, no_color: bool) -> RenderConfig {
    if no_color {
        RenderConfig::plain()
    } else {
        config.render_config()
    }
}

fn open_bundle(path: &Path) -> Result<Bundle> {
    tracing::debug!("Opening bundle {}", path.display());
    Bundle::open(path).with_context(|| format!("opening bundle {}", path.display()))
}

/// Analyze one or all clusters in a bundle
pub async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let bundle = open_bundle(&args.bundle)?;
    let settings = config.analyzer_settings();
    let analyzer = ClusterAnalyzer::new(bundle.reader(), bundle.logs(), &settings);

    let results: Vec<ClusterAnalysisResult> = match &args.cluster {
        Some(name) => {
            let cluster = find_cluster(bundle.reader(), name, args.namespace.as_deref()).await?;
            vec![analyzer.analyze_cluster(&cluster).await?]
        }
        None => analyzer.analyze_all().await?,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &results).context("writing JSON results")?;
        writeln!(out)?;
    } else {
        let mut printer = Printer::new(out, render_config(config, args.no_color));
        printer.process(&results)?;
    }

    Ok(())
}

/// Print the EKS Anywhere metadata of a cluster
pub async fn handle_summary(args: SummaryArgs, config: &Config) -> Result<()> {
    let bundle = open_bundle(&args.bundle)?;
    let metadata = cluster_metadata(bundle.reader(), &args.cluster, &args.namespace).await?;

    let stdout = std::io::stdout();
    let mut printer = Printer::new(stdout.lock(), render_config(config, args.no_color));
    printer.print_summary(&metadata)?;
    Ok(())
}
