//! Cluster metadata summary
//!
//! Reads the EKS Anywhere cluster specification captured in the bundle:
//! versions, provider and control plane shape.

use anyhow::Context;
use serde::Serialize;

use super::finding::ObjectRef;
use crate::bundle::{Reader, Registered};
use crate::models::eksa::{
    self, NutanixMachineConfig, TinkerbellMachineConfig, VSphereMachineConfig, provider_name,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    pub cluster: ObjectRef,
    pub eksa_version: Option<String>,
    pub kubernetes_version: String,
    pub provider: String,
    pub control_plane_count: i64,
    pub external_etcd: bool,
    pub registry_mirror: bool,
    pub os_family: Option<String>,
}

pub async fn cluster_metadata<R: Reader>(
    reader: &R,
    name: &str,
    namespace: &str,
) -> anyhow::Result<ClusterMetadata> {
    let cluster: eksa::Cluster = reader
        .get(name, namespace)
        .await
        .with_context(|| format!("reading EKS Anywhere cluster {}/{}", namespace, name))?;
    let spec = &cluster.spec;

    let os_family = match &spec.control_plane_configuration.machine_group_ref {
        Some(machine_ref) => {
            let name = machine_ref.name.as_str();
            match machine_ref.kind.as_str() {
                "TinkerbellMachineConfig" => {
                    os_family_of::<_, TinkerbellMachineConfig>(reader, name, namespace, |c| {
                        c.spec.os_family.clone()
                    })
                    .await?
                }
                "VSphereMachineConfig" => {
                    os_family_of::<_, VSphereMachineConfig>(reader, name, namespace, |c| {
                        c.spec.os_family.clone()
                    })
                    .await?
                }
                "NutanixMachineConfig" => {
                    os_family_of::<_, NutanixMachineConfig>(reader, name, namespace, |c| {
                        c.spec.os_family.clone()
                    })
                    .await?
                }
                other => {
                    tracing::debug!("No OS family lookup for machine config kind {}", other);
                    None
                }
            }
        }
        None => None,
    };

    Ok(ClusterMetadata {
        cluster: ObjectRef::new(name, namespace),
        eksa_version: spec.eksa_version.clone(),
        kubernetes_version: spec.kubernetes_version.clone(),
        provider: provider_name(&spec.datacenter_ref.kind).to_string(),
        control_plane_count: spec.control_plane_configuration.count,
        external_etcd: spec.external_etcd_configuration.is_some(),
        registry_mirror: spec.registry_mirror_configuration.is_some(),
        os_family,
    })
}

/// OS family from a machine config; a config missing from the bundle has none
async fn os_family_of<R: Reader, K: Registered>(
    reader: &R,
    name: &str,
    namespace: &str,
    os_family: fn(&K) -> Option<String>,
) -> anyhow::Result<Option<String>> {
    match reader.get::<K>(name, namespace).await {
        Ok(config) => Ok(os_family(&config)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading machine config {}", name)),
    }
}
