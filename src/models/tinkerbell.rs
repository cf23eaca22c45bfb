//! Tinkerbell provider resources
//!
//! `TinkerbellMachine` is the infrastructure machine backing a Cluster API
//! `Machine` on bare metal. A `Workflow` is the provisioning job Tinkerbell
//! runs for it: tasks made of actions, each with its own state.

use std::collections::BTreeMap;
use std::fmt;

use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "TinkerbellMachine",
    namespaced,
    status = "TinkerbellMachineStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellMachineSpec {
    #[serde(default, rename = "providerID", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_lookup_base_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellMachineStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TinkerbellMachine {
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "tinkerbell.org",
    version = "v1alpha1",
    kind = "Workflow",
    namespaced,
    status = "WorkflowStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_ref: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hardware_map: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    #[serde(default)]
    pub state: WorkflowState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_action: Option<String>,
    // The upstream field name carries this spelling.
    #[serde(default, rename = "templateRending", skip_serializing_if = "Option::is_none")]
    pub template_rendering: Option<String>,
    #[serde(default)]
    pub global_timeout: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    #[serde(default, rename = "worker")]
    pub worker_addr: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub timeout: i64,
    #[serde(default)]
    pub status: WorkflowState,
    #[serde(default)]
    pub seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// State of a workflow or of a single action.
///
/// Unrecognised values are kept verbatim in `Other` so newer Tinkerbell
/// releases don't break deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowState {
    Preparing,
    Pending,
    Running,
    Post,
    Success,
    Failed,
    Timeout,
    Other(String),
}

impl WorkflowState {
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowState::Preparing => "STATE_PREPARING",
            WorkflowState::Pending => "STATE_PENDING",
            WorkflowState::Running => "STATE_RUNNING",
            WorkflowState::Post => "STATE_POST",
            WorkflowState::Success => "STATE_SUCCESS",
            WorkflowState::Failed => "STATE_FAILED",
            WorkflowState::Timeout => "STATE_TIMEOUT",
            WorkflowState::Other(s) => s,
        }
    }

    /// Human readable status word used in findings ("failed", "running", ...)
    pub fn status_word(&self) -> String {
        match self {
            WorkflowState::Timeout => "timed out".to_string(),
            WorkflowState::Other(s) if s.is_empty() => "unknown".to_string(),
            other => other
                .as_str()
                .trim_start_matches("STATE_")
                .to_lowercase(),
        }
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Other(String::new())
    }
}

impl From<String> for WorkflowState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STATE_PREPARING" => WorkflowState::Preparing,
            "STATE_PENDING" => WorkflowState::Pending,
            "STATE_RUNNING" => WorkflowState::Running,
            "STATE_POST" => WorkflowState::Post,
            "STATE_SUCCESS" => WorkflowState::Success,
            "STATE_FAILED" => WorkflowState::Failed,
            "STATE_TIMEOUT" => WorkflowState::Timeout,
            _ => WorkflowState::Other(s),
        }
    }
}

impl From<WorkflowState> for String {
    fn from(state: WorkflowState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Workflow {
    pub fn state(&self) -> WorkflowState {
        self.status
            .as_ref()
            .map(|s| s.state.clone())
            .unwrap_or_default()
    }
}
