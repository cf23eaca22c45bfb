//! Support bundle diagnostics library
//!
//! This library provides the core functionality of the bundlediag binary:
//! reading support bundles as if they were a live API server and analyzing
//! the Cluster API resources they contain. It can be used both as a binary
//! and as a library for testing.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod models;

// Re-export commonly used types for convenience
pub use bundle::{Bundle, BundleError, BundleResult, ObjectReader, Reader};
pub use diagnostics::{ClusterAnalysisResult, ClusterAnalyzer, Finding, Printer};
