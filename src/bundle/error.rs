//! Bundle errors

use std::path::PathBuf;

use kube::core::GroupVersionKind;

/// Errors raised while loading or querying a support bundle
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("{} {} not found", gvk_display(.gvk), object_key(.namespace, .name))]
    NotFound {
        gvk: GroupVersionKind,
        name: String,
        namespace: String,
    },

    #[error("invalid resource file {}: {reason}", .path.display())]
    Schema { path: PathBuf, reason: String },

    #[error("{} is {scope}, it can't be queried with namespace {namespace:?}", gvk_display(.gvk))]
    Scope {
        gvk: GroupVersionKind,
        scope: &'static str,
        namespace: String,
    },

    #[error("unsupported kind {kind}")]
    UnsupportedKind { kind: String },

    #[error("unsupported log format in {}: expected one log file, found {files}", .path.display())]
    UnsupportedLogFormat { path: PathBuf, files: usize },

    #[error("can't read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't decode {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("can't extract bundle archive {}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BundleError::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BundleError::NotFound { .. })
    }
}

/// Result type for bundle operations
pub type BundleResult<T> = Result<T, BundleError>;

/// kubectl style type name: `Machine.v1beta1.cluster.x-k8s.io`, `Pod.v1`
pub fn gvk_display(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        format!("{}.{}", gvk.kind, gvk.version)
    } else {
        format!("{}.{}.{}", gvk.kind, gvk.version, gvk.group)
    }
}

/// `namespace/name`, or just `name` for cluster scoped objects
pub fn object_key(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}
