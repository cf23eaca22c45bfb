//! Cluster diagnostics
//!
//! Walks Cluster API resources top down (cluster, control plane, machines,
//! infrastructure machines, provisioning workflows) and reports what is not
//! healthy as a tree of findings, with correlated controller logs.
//!
//! Structure:
//! - `analyzer.rs` - analyzer graph and its executor
//! - `cluster.rs` - per-cluster entry points
//! - `finding.rs` - finding tree and results
//! - `format.rs` - colors, status lines and log highlighting
//! - `printer.rs` - text output
//! - `summary.rs` - EKS Anywhere cluster metadata

pub mod analyzer;
pub mod cluster;
pub mod finding;
pub mod format;
pub mod printer;
pub mod summary;

pub use analyzer::{Analyzer, AnalyzerSettings, Readers, run};
pub use cluster::{ClusterAnalyzer, find_cluster};
pub use finding::{ClusterAnalysisResult, Finding, Log, ObjectRef, Severity, StatusLine};
pub use format::{ColorMode, LogHighlighter, RenderConfig};
pub use printer::Printer;
pub use summary::{ClusterMetadata, cluster_metadata};
