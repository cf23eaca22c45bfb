//! Resource model layer
//!
//! This module provides Rust types for the custom resources a support bundle
//! is diagnosed through. Core Kubernetes kinds come from `k8s-openapi`.
//!
//! Structure:
//! - `capi.rs` - Cluster API resources (Cluster, KubeadmControlPlane, Machine)
//! - `tinkerbell.rs` - Tinkerbell provider resources (TinkerbellMachine, Workflow)
//! - `eksa.rs` - EKS Anywhere cluster specification resources
//! - `extensions.rs` - Condition helpers shared by the models

pub mod capi;
pub mod eksa;
pub mod extensions;
pub mod tinkerbell;

pub use extensions::{Condition, ConditionsExt};
