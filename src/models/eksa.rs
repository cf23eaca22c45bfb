//! EKS Anywhere cluster specification resources
//!
//! These carry the user facing cluster configuration (versions, provider,
//! machine configs) and feed the bundle summary.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Reference from a cluster spec to another EKS Anywhere object
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Ref {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "anywhere.eks.amazonaws.com",
    version = "v1alpha1",
    kind = "Cluster",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default)]
    pub kubernetes_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eksa_version: Option<String>,
    #[serde(default)]
    pub control_plane_configuration: ControlPlaneConfiguration,
    #[serde(default)]
    pub datacenter_ref: Ref,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_etcd_configuration: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_mirror_configuration: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneConfiguration {
    #[serde(default)]
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_group_ref: Option<Ref>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "anywhere.eks.amazonaws.com",
    version = "v1alpha1",
    kind = "TinkerbellMachineConfig",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellMachineConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_selector: Option<serde_json::Value>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "anywhere.eks.amazonaws.com",
    version = "v1alpha1",
    kind = "VSphereMachineConfig",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct VSphereMachineConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "anywhere.eks.amazonaws.com",
    version = "v1alpha1",
    kind = "NutanixMachineConfig",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct NutanixMachineConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
}

/// Provider display name for a datacenter config kind
pub fn provider_name(datacenter_kind: &str) -> &str {
    match datacenter_kind {
        "VSphereDatacenterConfig" => "vSphere",
        "TinkerbellDatacenterConfig" => "Tinkerbell",
        "CloudStackDatacenterConfig" => "CloudStack",
        "SnowDatacenterConfig" => "Snow",
        "NutanixDatacenterConfig" => "Nutanix",
        "DockerDatacenterConfig" => "Docker",
        other => other,
    }
}
