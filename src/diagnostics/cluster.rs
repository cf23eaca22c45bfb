//! Cluster level entry points of the analyzer graph

use anyhow::Context;
use kube::Resource;

use super::analyzer::{Analyzer, AnalyzerSettings, Readers, run};
use super::finding::{ClusterAnalysisResult, Finding, ObjectRef, StatusLine};
use crate::bundle::{BundleError, ListOption, PodLogsReader, Reader};
use crate::models::ConditionsExt;
use crate::models::capi::{CONTROL_PLANE_READY_CONDITION, Cluster};

/// Runs the analyzer graph for Cluster API clusters found in a bundle
pub struct ClusterAnalyzer<'a, R, L> {
    readers: Readers<'a, R, L>,
}

impl<'a, R: Reader, L: PodLogsReader> ClusterAnalyzer<'a, R, L> {
    pub fn new(client: &'a R, logs: &'a L, settings: &'a AnalyzerSettings) -> Self {
        Self {
            readers: Readers {
                client,
                logs,
                settings,
            },
        }
    }

    /// Analyze one cluster. Any read error aborts the whole analysis.
    pub async fn analyze_cluster(
        &self,
        cluster: &Cluster,
    ) -> anyhow::Result<ClusterAnalysisResult> {
        let id = ObjectRef::from_meta(cluster.meta());
        let mut findings = Vec::new();

        if !cluster.is_condition_true(CONTROL_PLANE_READY_CONDITION) {
            tracing::debug!("Cluster {} control plane is not ready", id);
            match &cluster.spec.control_plane_ref {
                None => findings.push(Finding::warning(StatusLine::object(
                    "Cluster",
                    &id.namespace,
                    &id.name,
                    "missing a control plane reference",
                ))),
                Some(reference) => {
                    let kind = reference.kind.as_deref().unwrap_or_default();
                    if kind != "KubeadmControlPlane" {
                        return Err(BundleError::UnsupportedKind {
                            kind: kind.to_string(),
                        })
                        .with_context(|| format!("control plane of Cluster {}", id));
                    }

                    let analyzer = Analyzer::ControlPlane {
                        name: reference.name.clone().unwrap_or_default(),
                        namespace: reference
                            .namespace
                            .clone()
                            .unwrap_or_else(|| id.namespace.clone()),
                        cluster: id.name.clone(),
                    };
                    if let Some(finding) = run(self.readers, analyzer)
                        .await
                        .with_context(|| format!("analyzing Cluster {}", id))?
                    {
                        findings.push(finding);
                    }
                }
            }
        }

        Ok(ClusterAnalysisResult {
            cluster: id,
            findings,
        })
    }

    /// Analyze every cluster in the bundle, in namespace then name order.
    ///
    /// Stops at the first cluster that fails to analyze.
    pub async fn analyze_all(&self) -> anyhow::Result<Vec<ClusterAnalysisResult>> {
        let clusters: Vec<Cluster> = self
            .readers
            .client
            .list(&[])
            .await
            .context("listing clusters")?;

        let mut results = Vec::with_capacity(clusters.len());
        for cluster in &clusters {
            results.push(self.analyze_cluster(cluster).await?);
        }
        Ok(results)
    }
}

/// Find a cluster by name, optionally restricted to a namespace.
///
/// Clusters are looked up by listing so bundles that dump them in a
/// cluster-wide file resolve the same way as per-namespace dumps.
pub async fn find_cluster<R: Reader>(
    client: &R,
    name: &str,
    namespace: Option<&str>,
) -> anyhow::Result<Cluster> {
    let options: Vec<ListOption> = namespace.map(ListOption::in_namespace).into_iter().collect();
    let clusters: Vec<Cluster> = client.list(&options).await.context("listing clusters")?;
    let mut matches = clusters
        .into_iter()
        .filter(|c| c.meta().name.as_deref() == Some(name));

    let Some(cluster) = matches.next() else {
        anyhow::bail!(
            "cluster {} not found in bundle",
            crate::bundle::error::object_key(namespace.unwrap_or_default(), name)
        );
    };
    if matches.next().is_some() {
        anyhow::bail!(
            "cluster {} exists in more than one namespace, pass a namespace",
            name
        );
    }
    Ok(cluster)
}
