//! bundlediag - offline diagnostics for Kubernetes cluster support bundles
//!
//! Opens a support bundle, walks its Cluster API resources and prints what
//! is unhealthy together with the relevant controller logs.

use anyhow::Result;
use bundlediag::cli::{self, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    cli::run(args).await
}
