//! Type registry for bundle resources
//!
//! Maps a GroupVersionKind to the Rust type its objects decode into. Objects
//! are stored as a tagged `KubeObject` so the index can hold heterogeneous
//! kinds without type erasure.
//!
//! ## Adding a New Resource Type
//!
//! 1. Make sure the type implements `kube::Resource<DynamicType = ()>`
//!    (every `k8s-openapi` type and every `#[derive(CustomResource)]` does).
//! 2. Add a `Variant => path::to::Type` line to `register_kinds!` below.
//!
//! Objects of that kind are then decoded while loading the bundle and can be
//! queried with `Reader::get` / `Reader::list`.

use std::collections::{BTreeMap, HashMap};

use k8s_openapi::api::core::v1 as core_v1;
use k8s_openapi::api::{apps, batch, coordination, networking, policy, rbac, scheduling, storage};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use kube::core::GroupVersionKind;
use serde::de::DeserializeOwned;

use crate::models::{capi, eksa, tinkerbell};

/// A type that can be stored in and read back from the bundle index
pub trait Registered:
    Resource<DynamicType = ()> + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Wrap a decoded object into its tagged representation
    fn into_object(self) -> KubeObject;

    /// Borrow the typed object back out of its tagged representation
    fn from_object(object: &KubeObject) -> Option<&Self>;
}

/// Static GroupVersionKind of a resource type
pub fn gvk_of<K: Resource<DynamicType = ()>>() -> GroupVersionKind {
    GroupVersionKind {
        group: K::group(&()).into_owned(),
        version: K::version(&()).into_owned(),
        kind: K::kind(&()).into_owned(),
    }
}

/// Build a GroupVersionKind from an `apiVersion` (`group/version` or just
/// `version` for the core group) and a kind
pub fn gvk_from_api_version(api_version: &str, kind: &str) -> GroupVersionKind {
    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    GroupVersionKind {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    }
}

/// Decodes one JSON object into its tagged representation
pub type Decoder = fn(serde_json::Value) -> serde_json::Result<KubeObject>;

fn decode<K: Registered>(value: serde_json::Value) -> serde_json::Result<KubeObject> {
    serde_json::from_value::<K>(value).map(Registered::into_object)
}

/// Registry of the kinds the bundle loader understands
#[derive(Clone, Default)]
pub struct Scheme {
    decoders: HashMap<GroupVersionKind, Decoder>,
}

impl Scheme {
    /// An empty scheme. Use `Scheme::default_kinds()` for the built-in set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<K: Registered>(&mut self) {
        self.decoders.insert(gvk_of::<K>(), decode::<K>);
    }

    pub fn decoder(&self, gvk: &GroupVersionKind) -> Option<Decoder> {
        self.decoders.get(gvk).copied()
    }

}

macro_rules! register_kinds {
    ($($variant:ident => $type:ty),* $(,)?) => {
        /// A decoded bundle object, tagged by kind
        #[derive(Clone, Debug)]
        pub enum KubeObject {
            $($variant(Box<$type>),)*
        }

        impl KubeObject {
            pub fn meta(&self) -> &ObjectMeta {
                match self {
                    $(KubeObject::$variant(o) => o.meta(),)*
                }
            }
        }

        $(
            impl Registered for $type {
                fn into_object(self) -> KubeObject {
                    KubeObject::$variant(Box::new(self))
                }

                fn from_object(object: &KubeObject) -> Option<&Self> {
                    match object {
                        KubeObject::$variant(o) => Some(&**o),
                        _ => None,
                    }
                }
            }
        )*

        impl Scheme {
            /// Scheme with every kind this crate knows how to decode
            pub fn default_kinds() -> Self {
                let mut scheme = Self::new();
                $(scheme.register::<$type>();)*
                scheme
            }
        }
    };
}

register_kinds! {
    // core/v1
    Pod => core_v1::Pod,
    Node => core_v1::Node,
    Namespace => core_v1::Namespace,
    Service => core_v1::Service,
    ConfigMap => core_v1::ConfigMap,
    Event => core_v1::Event,
    Endpoints => core_v1::Endpoints,
    PersistentVolume => core_v1::PersistentVolume,
    PersistentVolumeClaim => core_v1::PersistentVolumeClaim,
    ServiceAccount => core_v1::ServiceAccount,
    LimitRange => core_v1::LimitRange,
    ResourceQuota => core_v1::ResourceQuota,
    // apps/v1
    Deployment => apps::v1::Deployment,
    DaemonSet => apps::v1::DaemonSet,
    ReplicaSet => apps::v1::ReplicaSet,
    StatefulSet => apps::v1::StatefulSet,
    // batch/v1
    Job => batch::v1::Job,
    CronJob => batch::v1::CronJob,
    // networking.k8s.io/v1
    Ingress => networking::v1::Ingress,
    IngressClass => networking::v1::IngressClass,
    NetworkPolicy => networking::v1::NetworkPolicy,
    // storage.k8s.io/v1
    StorageClass => storage::v1::StorageClass,
    VolumeAttachment => storage::v1::VolumeAttachment,
    // rbac.authorization.k8s.io/v1
    Role => rbac::v1::Role,
    RoleBinding => rbac::v1::RoleBinding,
    ClusterRole => rbac::v1::ClusterRole,
    ClusterRoleBinding => rbac::v1::ClusterRoleBinding,
    // policy/v1
    PodDisruptionBudget => policy::v1::PodDisruptionBudget,
    // scheduling.k8s.io/v1
    PriorityClass => scheduling::v1::PriorityClass,
    // coordination.k8s.io/v1
    Lease => coordination::v1::Lease,
    // Cluster API
    CapiCluster => capi::Cluster,
    KubeadmControlPlane => capi::KubeadmControlPlane,
    Machine => capi::Machine,
    // Tinkerbell
    TinkerbellMachine => tinkerbell::TinkerbellMachine,
    Workflow => tinkerbell::Workflow,
    // EKS Anywhere
    EksaCluster => eksa::Cluster,
    TinkerbellMachineConfig => eksa::TinkerbellMachineConfig,
    VSphereMachineConfig => eksa::VSphereMachineConfig,
    NutanixMachineConfig => eksa::NutanixMachineConfig,
}

impl KubeObject {
    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.meta().labels.as_ref()
    }
}
