//! Fixture bundles for integration tests
//!
//! Each test gets its own bundle written into a temporary directory, laid out
//! the way support bundle collection lays it out on disk.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

pub const CAPI_VERSION: &str = "cluster.x-k8s.io/v1beta1";
pub const KCP_VERSION: &str = "controlplane.cluster.x-k8s.io/v1beta1";
pub const INFRA_VERSION: &str = "infrastructure.cluster.x-k8s.io/v1beta1";
pub const TINKERBELL_VERSION: &str = "tinkerbell.org/v1alpha1";
pub const EKSA_VERSION: &str = "anywhere.eks.amazonaws.com/v1alpha1";

pub struct BundleBuilder {
    dir: TempDir,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create bundle dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn resources(&self) -> PathBuf {
        self.dir.path().join("cluster-resources")
    }

    fn write(&self, rel: impl AsRef<Path>, content: &[u8]) -> &Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().expect("fixture path has a parent"))
            .expect("create fixture dir");
        fs::write(path, content).expect("write fixture");
        self
    }

    fn write_json(&self, rel: impl AsRef<Path>, value: &Value) -> &Self {
        self.write(rel, &serde_json::to_vec_pretty(value).expect("encode fixture"))
    }

    /// `cluster-resources/<file>` holding a cluster wide List
    pub fn core_list(&self, file: &str, api_version: &str, kind: &str, items: Vec<Value>) -> &Self {
        self.write_json(
            Path::new("cluster-resources").join(file),
            &json!({
                "apiVersion": api_version,
                "kind": format!("{}List", kind),
                "items": items,
            }),
        )
    }

    /// `cluster-resources/<folder>/<namespace>.json` holding a namespace's List
    pub fn namespaced_list(
        &self,
        folder: &str,
        namespace: &str,
        api_version: &str,
        kind: &str,
        items: Vec<Value>,
    ) -> &Self {
        self.write_json(
            Path::new("cluster-resources")
                .join(folder)
                .join(format!("{}.json", namespace)),
            &json!({
                "apiVersion": api_version,
                "kind": format!("{}List", kind),
                "items": items,
            }),
        )
    }

    /// `cluster-resources/custom-resources/<resource>/<namespace>.json`
    pub fn custom(&self, resource: &str, namespace: &str, items: Vec<Value>) -> &Self {
        self.write_json(
            Path::new("cluster-resources")
                .join("custom-resources")
                .join(resource)
                .join(format!("{}.json", namespace)),
            &Value::Array(items),
        )
    }

    /// `cluster-resources/custom-resources/<resource>.json`, cluster scoped
    pub fn custom_cluster_scoped(&self, resource: &str, items: Vec<Value>) -> &Self {
        self.write_json(
            Path::new("cluster-resources")
                .join("custom-resources")
                .join(format!("{}.json", resource)),
            &Value::Array(items),
        )
    }

    /// `logs/<namespace>/<pod>/<container>.log`
    pub fn log(&self, namespace: &str, pod: &str, container: &str, lines: &[&str]) -> &Self {
        let mut content = lines.join("\n");
        content.push('\n');
        self.write(
            Path::new("logs")
                .join(namespace)
                .join(pod)
                .join(format!("{}.log", container)),
            content.as_bytes(),
        )
    }

    pub fn into_dir(self) -> TempDir {
        self.dir
    }
}

pub fn condition(type_: &str, status: &str, message: Option<&str>) -> Value {
    let mut condition = json!({"type": type_, "status": status});
    if let Some(message) = message {
        condition["message"] = json!(message);
    }
    condition
}

pub fn pod(name: &str, namespace: &str, labels: Value) -> Value {
    json!({
        "metadata": {"name": name, "namespace": namespace, "labels": labels},
        "spec": {"containers": [{"name": "main", "image": "busybox"}]}
    })
}

pub fn capi_cluster(name: &str, namespace: &str, conditions: Vec<Value>) -> Value {
    json!({
        "apiVersion": CAPI_VERSION,
        "kind": "Cluster",
        "metadata": {"name": name, "namespace": namespace},
        "spec": {
            "controlPlaneRef": {
                "apiVersion": KCP_VERSION,
                "kind": "KubeadmControlPlane",
                "name": name,
                "namespace": namespace
            }
        },
        "status": {"conditions": conditions}
    })
}

pub fn kcp(name: &str, namespace: &str, conditions: Vec<Value>) -> Value {
    json!({
        "apiVersion": KCP_VERSION,
        "kind": "KubeadmControlPlane",
        "metadata": {"name": name, "namespace": namespace},
        "spec": {"replicas": 1, "version": "v1.31.0"},
        "status": {"conditions": conditions}
    })
}

pub fn control_plane_machine(
    name: &str,
    namespace: &str,
    cluster: &str,
    conditions: Vec<Value>,
) -> Value {
    json!({
        "apiVersion": CAPI_VERSION,
        "kind": "Machine",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": {
                "cluster.x-k8s.io/cluster-name": cluster,
                "cluster.x-k8s.io/control-plane": ""
            }
        },
        "spec": {
            "clusterName": cluster,
            "infrastructureRef": {
                "apiVersion": INFRA_VERSION,
                "kind": "TinkerbellMachine",
                "name": name,
                "namespace": namespace
            }
        },
        "status": {"conditions": conditions}
    })
}

pub fn tinkerbell_machine(name: &str, namespace: &str, ready: bool) -> Value {
    json!({
        "apiVersion": INFRA_VERSION,
        "kind": "TinkerbellMachine",
        "metadata": {"name": name, "namespace": namespace},
        "spec": {"hardwareName": format!("hw-{}", name)},
        "status": {"ready": ready}
    })
}

pub fn workflow(name: &str, namespace: &str, state: &str, actions: Vec<Value>) -> Value {
    json!({
        "apiVersion": TINKERBELL_VERSION,
        "kind": "Workflow",
        "metadata": {"name": name, "namespace": namespace},
        "spec": {"templateRef": name},
        "status": {
            "state": state,
            "currentAction": actions
                .iter()
                .find(|a| a["status"] != "STATE_SUCCESS")
                .and_then(|a| a["name"].as_str()),
            "tasks": [{
                "name": "os-installation",
                "worker": "52:54:00:00:00:01",
                "actions": actions
            }]
        }
    })
}

pub fn action(name: &str, image: &str, status: &str, message: Option<&str>) -> Value {
    json!({
        "name": name,
        "image": image,
        "timeout": 600,
        "status": status,
        "message": message,
    })
}

/// Controller log line about a TinkerbellMachine, in logr key/value form
pub fn controller_line(name: &str, namespace: &str, message: &str, error: Option<&str>) -> String {
    let mut line = format!(
        r#"{} INFO controllers.TinkerbellMachine {} {{"controllerKind"="TinkerbellMachine", "name"="{}", "namespace"="{}"}}"#,
        "2024-05-01T10:00:00.000Z", message, name, namespace
    );
    if let Some(error) = error {
        line.push_str(&format!(r#" "error"="{}""#, error));
    }
    line
}

/// Namespace the demo cluster lives in
pub const DEMO_NAMESPACE: &str = "eksa-system";

/// A management cluster "demo" whose single control plane machine never
/// provisioned: the cluster, its control plane, the machine and the
/// TinkerbellMachine all report not ready, the controller logged a failed
/// workflow and the workflow itself is in `workflow_state`.
pub fn failing_demo_bundle(workflow_state: &str) -> BundleBuilder {
    let ns = DEMO_NAMESPACE;
    let machine = "demo-cp-1";
    let bundle = BundleBuilder::new();

    bundle
        .core_list(
            "clusters.json",
            CAPI_VERSION,
            "Cluster",
            vec![capi_cluster(
                "demo",
                ns,
                vec![condition(
                    "ControlPlaneReady",
                    "False",
                    Some("Scaling up control plane to 1 replicas (actual 0)"),
                )],
            )],
        )
        .custom(
            "kubeadmcontrolplanes.controlplane.cluster.x-k8s.io",
            ns,
            vec![kcp(
                "demo",
                ns,
                vec![condition("Ready", "False", Some("1 of 1 machines not ready"))],
            )],
        )
        .custom(
            "machines.cluster.x-k8s.io",
            ns,
            vec![control_plane_machine(
                machine,
                ns,
                "demo",
                vec![
                    condition("Ready", "False", Some("waiting for infrastructure")),
                    condition("InfrastructureReady", "False", None),
                ],
            )],
        )
        .custom(
            "tinkerbellmachines.infrastructure.cluster.x-k8s.io",
            ns,
            vec![tinkerbell_machine(machine, ns, false)],
        )
        .custom(
            "workflows.tinkerbell.org",
            ns,
            vec![workflow(
                machine,
                ns,
                workflow_state,
                vec![
                    action("stream-image", "image2disk:v1", "STATE_SUCCESS", None),
                    action(
                        "write-netplan",
                        "writefile:v1",
                        if workflow_state == "STATE_SUCCESS" {
                            "STATE_SUCCESS"
                        } else {
                            "STATE_FAILED"
                        },
                        Some("mount failed: no such device"),
                    ),
                ],
            )],
        );

    let provisioning = controller_line(machine, ns, "Provisioning hardware", None);
    let failed = controller_line(machine, ns, "Reconciler error", Some("workflow failed"));
    let unrelated = controller_line("other-machine", ns, "Reconciler error", None);
    bundle.log(
        "capt-system",
        "capt-controller-manager-6d8f9c-x2k4p",
        "manager",
        &[&provisioning, &unrelated, &failed],
    );

    bundle
}
