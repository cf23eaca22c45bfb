//! Finding tree produced by the analyzers

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Serialize, Serializer};

use crate::bundle::error::object_key;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// `"{kind} {namespace}/{name} {verb} {status}[: detail]"`
///
/// Kept structured so renderers can style the status token on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: String,
    pub key: String,
    pub status: String,
    pub detail: Option<String>,
}

impl StatusLine {
    pub fn new(kind: impl Into<String>, key: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
            status: status.into(),
            detail: None,
        }
    }

    /// Status line for a namespaced object
    pub fn object(kind: &str, namespace: &str, name: &str, status: impl Into<String>) -> Self {
        Self::new(kind, object_key(namespace, name), status)
    }

    /// Attach a detail message; empty messages are dropped
    pub fn with_detail(mut self, detail: Option<impl Into<String>>) -> Self {
        self.detail = detail.map(Into::into).filter(|d: &String| !d.is_empty());
        self
    }

    pub fn verb(&self) -> &'static str {
        if self.status == "failed" { "has" } else { "is" }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.kind, self.key, self.verb(), self.status)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

fn serialize_display<S: Serializer>(value: &StatusLine, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Log lines correlated with a finding
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Log {
    pub source: String,
    pub lines: Vec<String>,
}

/// One diagnostic observation, with nested observations below it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    #[serde(rename = "message", serialize_with = "serialize_display")]
    pub status: StatusLine,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<Log>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, status: StatusLine) -> Self {
        Self {
            severity,
            status,
            findings: Vec::new(),
            logs: Vec::new(),
            recommendation: None,
        }
    }

    pub fn error(status: StatusLine) -> Self {
        Self::new(Severity::Error, status)
    }

    pub fn warning(status: StatusLine) -> Self {
        Self::new(Severity::Warning, status)
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    /// Plain text message, without styling
    pub fn message(&self) -> String {
        self.status.to_string()
    }

    /// This finding and all nested ones, depth first, paired with their depth
    pub fn flatten(&self) -> Vec<(usize, &Finding)> {
        let mut out = Vec::new();
        self.flatten_into(0, &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a Finding)>) {
        out.push((depth, self));
        for child in &self.findings {
            child.flatten_into(depth + 1, out);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn from_meta(meta: &ObjectMeta) -> Self {
        Self::new(
            meta.name.clone().unwrap_or_default(),
            meta.namespace.clone().unwrap_or_default(),
        )
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&object_key(&self.namespace, &self.name))
    }
}

/// Findings for one cluster; no findings means healthy
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterAnalysisResult {
    pub cluster: ObjectRef,
    pub findings: Vec<Finding>,
}

impl ClusterAnalysisResult {
    pub fn is_healthy(&self) -> bool {
        self.findings.is_empty()
    }
}
