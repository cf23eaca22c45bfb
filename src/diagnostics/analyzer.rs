//! Analyzer graph
//!
//! Each `Analyzer` looks at one resource. A healthy resource yields nothing;
//! an unhealthy one yields a `Finding` plus the analyzers for the resources
//! that explain it. `run` expands that graph depth first, one node at a
//! time, nesting child findings under their parent.

use anyhow::Context;
use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Resource;

use super::finding::{Finding, Log, ObjectRef, Severity, StatusLine};
use crate::bundle::error::object_key;
use crate::bundle::{BundleError, ListOption, PodLogsReader, Reader, contains};
use crate::models::ConditionsExt;
use crate::models::capi::{
    CLUSTER_NAME_LABEL, CONTROL_PLANE_LABEL, INFRASTRUCTURE_READY_CONDITION, KubeadmControlPlane,
    Machine, READY_CONDITION,
};
use crate::models::tinkerbell::{self, TinkerbellMachine, Workflow, WorkflowState};

/// Controller log line marking a failed provisioning workflow
pub const WORKFLOW_FAILED_MARKER: &str = r#""error"="workflow failed""#;

/// Where the infrastructure controller logs live and how much of them to keep
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalyzerSettings {
    pub controller_namespace: String,
    pub controller_deployment: String,
    /// Trailing log lines attached to a finding; 0 keeps every line
    pub max_log_lines: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            controller_namespace: "capt-system".to_string(),
            controller_deployment: "capt-controller-manager".to_string(),
            max_log_lines: 10,
        }
    }
}

impl AnalyzerSettings {
    fn log_source(&self) -> String {
        format!("{}/{}", self.controller_namespace, self.controller_deployment)
    }
}

/// Data sources shared by every analyzer of a run
pub struct Readers<'a, R, L> {
    pub client: &'a R,
    pub logs: &'a L,
    pub settings: &'a AnalyzerSettings,
}

impl<R, L> Clone for Readers<'_, R, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, L> Copy for Readers<'_, R, L> {}

/// One node of the diagnostic graph
#[derive(Clone, Debug)]
pub enum Analyzer {
    /// KubeadmControlPlane of a cluster
    ControlPlane {
        name: String,
        namespace: String,
        cluster: String,
    },
    Machine(Box<Machine>),
    /// Infrastructure machine behind a Machine, dispatched on its kind
    InfraMachine {
        owner: ObjectRef,
        reference: ObjectReference,
    },
    Workflow {
        name: String,
        namespace: String,
    },
    Action {
        task: String,
        action: tinkerbell::Action,
    },
}

/// A finding and the analyzers that drill into it
#[derive(Debug)]
pub struct AnalyzeResults {
    pub finding: Finding,
    pub next_analyzers: Vec<Analyzer>,
}

impl AnalyzeResults {
    fn leaf(finding: Finding) -> Self {
        Self {
            finding,
            next_analyzers: Vec::new(),
        }
    }
}

impl Analyzer {
    /// Identity of the analyzed resource, used in error context
    pub fn describe(&self) -> String {
        match self {
            Analyzer::ControlPlane {
                name, namespace, ..
            } => format!("KubeadmControlPlane {}", object_key(namespace, name)),
            Analyzer::Machine(machine) => {
                format!("Machine {}", ObjectRef::from_meta(machine.meta()))
            }
            Analyzer::InfraMachine { owner, reference } => format!(
                "{} {} of Machine {}",
                reference.kind.as_deref().unwrap_or("infrastructure machine"),
                object_key(
                    reference.namespace.as_deref().unwrap_or(&owner.namespace),
                    reference.name.as_deref().unwrap_or_default()
                ),
                owner
            ),
            Analyzer::Workflow { name, namespace } => {
                format!("Workflow {}", object_key(namespace, name))
            }
            Analyzer::Action { task, action } => format!("Action {}/{}", task, action.name),
        }
    }

    pub async fn analyze<R: Reader, L: PodLogsReader>(
        &self,
        readers: Readers<'_, R, L>,
    ) -> anyhow::Result<Option<AnalyzeResults>> {
        match self {
            Analyzer::ControlPlane {
                name,
                namespace,
                cluster,
            } => analyze_control_plane(readers, name, namespace, cluster).await,
            Analyzer::Machine(machine) => Ok(analyze_machine(machine)),
            Analyzer::InfraMachine { owner, reference } => {
                analyze_infra_machine(readers, owner, reference).await
            }
            Analyzer::Workflow { name, namespace } => {
                analyze_workflow(readers, name, namespace).await
            }
            Analyzer::Action { task, action } => Ok(analyze_action(task, action)),
        }
    }
}

/// Expand `analyzer` and everything below it into a finding tree.
///
/// Children run one after another in declaration order. The first error
/// aborts the whole run.
pub fn run<'a, R: Reader, L: PodLogsReader>(
    readers: Readers<'a, R, L>,
    analyzer: Analyzer,
) -> BoxFuture<'a, anyhow::Result<Option<Finding>>> {
    async move {
        tracing::debug!("Analyzing {}", analyzer.describe());

        let results = analyzer
            .analyze(readers)
            .await
            .with_context(|| format!("analyzing {}", analyzer.describe()))?;
        let Some(AnalyzeResults {
            mut finding,
            next_analyzers,
        }) = results
        else {
            return Ok(None);
        };

        for next in next_analyzers {
            if let Some(child) = run(readers, next).await? {
                finding.findings.push(child);
            }
        }

        Ok(Some(finding))
    }
    .boxed()
}

async fn analyze_control_plane<R: Reader, L: PodLogsReader>(
    readers: Readers<'_, R, L>,
    name: &str,
    namespace: &str,
    cluster: &str,
) -> anyhow::Result<Option<AnalyzeResults>> {
    let kcp: KubeadmControlPlane = readers.client.get(name, namespace).await?;
    if kcp.is_condition_true(READY_CONDITION) {
        return Ok(None);
    }

    let finding = Finding::error(
        StatusLine::object("KubeadmControlPlane", namespace, name, "not ready")
            .with_detail(kcp.condition_message(READY_CONDITION)),
    );

    let machines: Vec<Machine> = readers
        .client
        .list(&[
            ListOption::in_namespace(namespace),
            ListOption::matching_label(CLUSTER_NAME_LABEL, cluster),
            ListOption::has_label(CONTROL_PLANE_LABEL),
        ])
        .await
        .with_context(|| format!("listing control plane machines of cluster {}", cluster))?;

    Ok(Some(AnalyzeResults {
        finding,
        next_analyzers: machines
            .into_iter()
            .map(|m| Analyzer::Machine(Box::new(m)))
            .collect(),
    }))
}

fn analyze_machine(machine: &Machine) -> Option<AnalyzeResults> {
    if machine.is_condition_true(READY_CONDITION) {
        return None;
    }

    let id = ObjectRef::from_meta(machine.meta());
    let finding = Finding::error(
        StatusLine::object("Machine", &id.namespace, &id.name, "not ready")
            .with_detail(machine.condition_message(READY_CONDITION)),
    );

    if machine.is_condition_true(INFRASTRUCTURE_READY_CONDITION) {
        return Some(AnalyzeResults::leaf(finding.with_recommendation(
            "Infrastructure is ready. Check the bootstrap logs (cloud-init, kubelet) on the node.",
        )));
    }

    Some(AnalyzeResults {
        finding,
        next_analyzers: vec![Analyzer::InfraMachine {
            owner: id,
            reference: machine.spec.infrastructure_ref.clone(),
        }],
    })
}

async fn analyze_infra_machine<R: Reader, L: PodLogsReader>(
    readers: Readers<'_, R, L>,
    owner: &ObjectRef,
    reference: &ObjectReference,
) -> anyhow::Result<Option<AnalyzeResults>> {
    let name = reference.name.as_deref().unwrap_or_default();
    let namespace = reference.namespace.as_deref().unwrap_or(&owner.namespace);

    match reference.kind.as_deref().unwrap_or_default() {
        "TinkerbellMachine" => analyze_tinkerbell_machine(readers, name, namespace).await,
        kind => Err(BundleError::UnsupportedKind {
            kind: kind.to_string(),
        })
        .with_context(|| format!("infrastructure of Machine {}", owner)),
    }
}

async fn analyze_tinkerbell_machine<R: Reader, L: PodLogsReader>(
    readers: Readers<'_, R, L>,
    name: &str,
    namespace: &str,
) -> anyhow::Result<Option<AnalyzeResults>> {
    let machine: TinkerbellMachine = readers.client.get(name, namespace).await?;
    if machine.is_ready() {
        return Ok(None);
    }

    let settings = readers.settings;
    let filters = [
        contains(r#""controllerKind"="TinkerbellMachine""#),
        contains(format!(r#""name"="{}""#, name)),
        contains(format!(r#""namespace"="{}""#, namespace)),
    ];
    let lines = readers
        .logs
        .logs_from_deployment(
            &settings.controller_deployment,
            &settings.controller_namespace,
            &filters,
        )
        .await
        .with_context(|| format!("reading {} logs", settings.log_source()))?;

    let workflow_failed = lines
        .last()
        .is_some_and(|line| line.contains(WORKFLOW_FAILED_MARKER));

    let detail = machine
        .status
        .as_ref()
        .and_then(|s| s.error_message.clone());
    let mut finding = Finding::error(
        StatusLine::object("TinkerbellMachine", namespace, name, "not ready").with_detail(detail),
    );
    if !lines.is_empty() {
        finding = finding.with_log(Log {
            source: settings.log_source(),
            lines: tail(lines, settings.max_log_lines),
        });
    }

    let next_analyzers = if workflow_failed {
        vec![Analyzer::Workflow {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }]
    } else {
        Vec::new()
    };

    Ok(Some(AnalyzeResults {
        finding,
        next_analyzers,
    }))
}

async fn analyze_workflow<R: Reader, L: PodLogsReader>(
    readers: Readers<'_, R, L>,
    name: &str,
    namespace: &str,
) -> anyhow::Result<Option<AnalyzeResults>> {
    let workflow: Workflow = readers.client.get(name, namespace).await?;
    let state = workflow.state();
    let Some(severity) = state_severity(&state) else {
        return Ok(None);
    };

    let status = workflow.status.unwrap_or_default();
    let detail = status
        .current_action
        .map(|action| format!("current action {}", action));
    let finding = Finding::new(
        severity,
        StatusLine::object("Workflow", namespace, name, state.status_word()).with_detail(detail),
    );

    let next_analyzers = status
        .tasks
        .into_iter()
        .flat_map(|task| {
            let task_name = task.name;
            task.actions.into_iter().map(move |action| Analyzer::Action {
                task: task_name.clone(),
                action,
            })
        })
        .collect();

    Ok(Some(AnalyzeResults {
        finding,
        next_analyzers,
    }))
}

fn analyze_action(task: &str, action: &tinkerbell::Action) -> Option<AnalyzeResults> {
    let severity = state_severity(&action.status)?;
    let mut finding = Finding::new(
        severity,
        StatusLine::new(
            "Action",
            format!("{}/{}", task, action.name),
            action.status.status_word(),
        )
        .with_detail(action.message.clone()),
    );

    if severity == Severity::Error && !action.image.is_empty() {
        finding = finding.with_recommendation(format!(
            "Check the output of the {} container on the worker.",
            action.image
        ));
    }

    Some(AnalyzeResults::leaf(finding))
}

/// Severity of a workflow or action state. Healthy and unrecognised states
/// have nothing to report.
pub fn state_severity(state: &WorkflowState) -> Option<Severity> {
    match state {
        WorkflowState::Failed | WorkflowState::Timeout => Some(Severity::Error),
        WorkflowState::Pending
        | WorkflowState::Running
        | WorkflowState::Post
        | WorkflowState::Preparing => Some(Severity::Warning),
        WorkflowState::Success | WorkflowState::Other(_) => None,
    }
}

fn tail(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if max > 0 && lines.len() > max {
        lines.drain(..lines.len() - max);
    }
    lines
}
