//! End to end analysis of fixture bundles

mod common;

use bundlediag::bundle::{Bundle, BundleError};
use bundlediag::diagnostics::{
    AnalyzerSettings, ClusterAnalysisResult, ClusterAnalyzer, Severity, find_cluster,
};
use common::{
    BundleBuilder, CAPI_VERSION, DEMO_NAMESPACE, capi_cluster, condition, control_plane_machine,
    failing_demo_bundle, kcp,
};
use serde_json::json;

async fn analyze_all(fixture: &BundleBuilder) -> anyhow::Result<Vec<ClusterAnalysisResult>> {
    let bundle = Bundle::open(fixture.path())?;
    let settings = AnalyzerSettings::default();
    ClusterAnalyzer::new(bundle.reader(), bundle.logs(), &settings)
        .analyze_all()
        .await
}

fn messages(result: &ClusterAnalysisResult) -> Vec<(usize, String)> {
    result
        .findings
        .iter()
        .flat_map(|f| f.flatten())
        .map(|(depth, f)| (depth, f.message()))
        .collect()
}

#[tokio::test]
async fn unready_cluster_descends_into_its_control_plane() {
    let fixture = BundleBuilder::new();
    fixture
        .core_list(
            "clusters.json",
            CAPI_VERSION,
            "Cluster",
            vec![capi_cluster("demo", DEMO_NAMESPACE, vec![])],
        )
        .custom(
            "kubeadmcontrolplanes.controlplane.cluster.x-k8s.io",
            DEMO_NAMESPACE,
            vec![kcp("demo", DEMO_NAMESPACE, vec![])],
        );

    let results = analyze_all(&fixture).await.unwrap();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    assert_eq!(result.cluster.to_string(), "eksa-system/demo");
    assert!(!result.is_healthy());
    assert_eq!(
        messages(result),
        vec![(0, "KubeadmControlPlane eksa-system/demo is not ready".to_string())]
    );
}

#[tokio::test]
async fn failed_workflow_is_traced_down_to_the_failing_action() {
    let fixture = failing_demo_bundle("STATE_FAILED");
    let results = analyze_all(&fixture).await.unwrap();

    assert_eq!(
        messages(&results[0]),
        vec![
            (
                0,
                "KubeadmControlPlane eksa-system/demo is not ready: 1 of 1 machines not ready"
                    .to_string()
            ),
            (
                1,
                "Machine eksa-system/demo-cp-1 is not ready: waiting for infrastructure".to_string()
            ),
            (2, "TinkerbellMachine eksa-system/demo-cp-1 is not ready".to_string()),
            (
                3,
                "Workflow eksa-system/demo-cp-1 has failed: current action write-netplan"
                    .to_string()
            ),
            (
                4,
                "Action os-installation/write-netplan has failed: mount failed: no such device"
                    .to_string()
            ),
        ]
    );

    let flat: Vec<_> = results[0].findings[0].flatten();
    assert!(flat.iter().all(|(_, f)| f.severity == Severity::Error));

    let (_, tinkerbell_machine) = flat[2];
    assert_eq!(tinkerbell_machine.logs.len(), 1);
    let log = &tinkerbell_machine.logs[0];
    assert_eq!(log.source, "capt-system/capt-controller-manager");
    assert_eq!(log.lines.len(), 2);
    assert!(log.lines[0].contains("Provisioning hardware"));
    assert!(log.lines[1].contains(r#""error"="workflow failed""#));

    let (_, action) = flat[4];
    assert_eq!(
        action.recommendation.as_deref(),
        Some("Check the output of the writefile:v1 container on the worker.")
    );
}

#[tokio::test]
async fn successful_workflow_adds_nothing() {
    let fixture = failing_demo_bundle("STATE_SUCCESS");
    let results = analyze_all(&fixture).await.unwrap();

    let flat = results[0].findings[0].flatten();
    assert_eq!(flat.len(), 3);
    let (depth, tinkerbell_machine) = flat[2];
    assert_eq!(depth, 2);
    assert!(tinkerbell_machine.findings.is_empty());
}

#[tokio::test]
async fn running_workflow_is_a_warning() {
    let fixture = failing_demo_bundle("STATE_RUNNING");
    let results = analyze_all(&fixture).await.unwrap();

    let flat = results[0].findings[0].flatten();
    let (_, workflow) = flat[3];
    assert_eq!(workflow.severity, Severity::Warning);
    assert_eq!(
        workflow.message(),
        "Workflow eksa-system/demo-cp-1 is running: current action write-netplan"
    );
}

#[tokio::test]
async fn healthy_clusters_have_no_findings() {
    let fixture = BundleBuilder::new();
    fixture.core_list(
        "clusters.json",
        CAPI_VERSION,
        "Cluster",
        vec![
            capi_cluster(
                "dev",
                "eksa-system",
                vec![condition("ControlPlaneReady", "True", None)],
            ),
            capi_cluster(
                "prod",
                "default",
                vec![condition("ControlPlaneReady", "True", None)],
            ),
        ],
    );

    // Namespace order, not name order
    let results = analyze_all(&fixture).await.unwrap();
    let ids: Vec<String> = results.iter().map(|r| r.cluster.to_string()).collect();
    assert_eq!(ids, vec!["default/prod", "eksa-system/dev"]);
    assert!(results.iter().all(ClusterAnalysisResult::is_healthy));
}

#[tokio::test]
async fn cluster_without_control_plane_reference_is_a_warning() {
    let fixture = BundleBuilder::new();
    fixture.custom(
        "clusters.cluster.x-k8s.io",
        "default",
        vec![json!({
            "apiVersion": CAPI_VERSION,
            "kind": "Cluster",
            "metadata": {"name": "bare", "namespace": "default"},
            "spec": {}
        })],
    );

    let results = analyze_all(&fixture).await.unwrap();
    let findings = &results[0].findings;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(
        findings[0].message(),
        "Cluster default/bare is missing a control plane reference"
    );
}

#[tokio::test]
async fn unsupported_infrastructure_kind_aborts_the_analysis() {
    let fixture = BundleBuilder::new();
    let mut machine = control_plane_machine("demo-cp-1", DEMO_NAMESPACE, "demo", vec![]);
    machine["spec"]["infrastructureRef"]["kind"] = json!("VSphereMachine");
    fixture
        .core_list(
            "clusters.json",
            CAPI_VERSION,
            "Cluster",
            vec![capi_cluster("demo", DEMO_NAMESPACE, vec![])],
        )
        .custom(
            "kubeadmcontrolplanes.controlplane.cluster.x-k8s.io",
            DEMO_NAMESPACE,
            vec![kcp("demo", DEMO_NAMESPACE, vec![])],
        )
        .custom("machines.cluster.x-k8s.io", DEMO_NAMESPACE, vec![machine]);

    let err = analyze_all(&fixture).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::UnsupportedKind { kind }) if kind == "VSphereMachine"
    ));
    let chain = format!("{:#}", err);
    assert!(chain.contains("analyzing Cluster eksa-system/demo"), "{}", chain);
    assert!(chain.contains("infrastructure of Machine eksa-system/demo-cp-1"), "{}", chain);
}

#[tokio::test]
async fn missing_control_plane_object_is_not_found() {
    let fixture = BundleBuilder::new();
    fixture.core_list(
        "clusters.json",
        CAPI_VERSION,
        "Cluster",
        vec![capi_cluster("demo", DEMO_NAMESPACE, vec![])],
    );

    let err = analyze_all(&fixture).await.unwrap_err();
    let not_found = err.downcast_ref::<BundleError>().map(BundleError::is_not_found);
    assert_eq!(not_found, Some(true));
    assert!(format!("{:#}", err).contains("analyzing KubeadmControlPlane eksa-system/demo"));
}

#[tokio::test]
async fn find_cluster_by_name_and_namespace() {
    let fixture = BundleBuilder::new();
    fixture.core_list(
        "clusters.json",
        CAPI_VERSION,
        "Cluster",
        vec![
            capi_cluster("demo", "eksa-system", vec![]),
            capi_cluster("other", "eksa-system", vec![]),
        ],
    );
    let bundle = Bundle::open(fixture.path()).unwrap();

    let cluster = find_cluster(bundle.reader(), "demo", None).await.unwrap();
    assert_eq!(cluster.metadata.namespace.as_deref(), Some("eksa-system"));

    let cluster = find_cluster(bundle.reader(), "demo", Some("eksa-system"))
        .await
        .unwrap();
    assert_eq!(cluster.metadata.name.as_deref(), Some("demo"));

    let err = find_cluster(bundle.reader(), "demo", Some("default"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
