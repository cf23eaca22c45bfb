//! Condition helpers for Cluster API style resources
//!
//! Cluster API resources report readiness through a `status.conditions` list
//! rather than a single flag. These helpers are implemented externally to the
//! model structs so every resource can share them.

use serde::{Deserialize, Serialize};

/// A Cluster API condition.
///
/// Only `type` and `status` are required; everything else is informational
/// and frequently missing in bundles captured mid-reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Returns true if the condition status is `True`
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Trait for resources exposing a list of conditions
pub trait ConditionsExt {
    fn conditions(&self) -> &[Condition];

    /// Find a condition by type
    fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.type_ == condition_type)
    }

    /// Returns true only if the condition is present and `True`.
    /// A missing condition counts as not true.
    fn is_condition_true(&self, condition_type: &str) -> bool {
        self.condition(condition_type)
            .map(Condition::is_true)
            .unwrap_or(false)
    }

    /// Message of a condition, if present and non-empty
    fn condition_message(&self, condition_type: &str) -> Option<&str> {
        self.condition(condition_type)
            .and_then(|c| c.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

impl ConditionsExt for [Condition] {
    fn conditions(&self) -> &[Condition] {
        self
    }
}

impl ConditionsExt for Vec<Condition> {
    fn conditions(&self) -> &[Condition] {
        self
    }
}
