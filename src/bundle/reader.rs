//! Object reader
//!
//! A read-only, Kubernetes-client shaped query surface over the loaded index.
//! Every returned object is an owned clone, so callers can't observe or
//! change index state.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use super::error::{BundleError, BundleResult};
use super::scheme::{KubeObject, Registered, Scheme, gvk_of};
use super::storage::{NamespaceObjects, Storage};

/// Query options for `Reader::list`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListOption {
    /// Restrict to one namespace
    InNamespace(String),
    /// Every label must be present with exactly this value
    MatchingLabels(BTreeMap<String, String>),
    /// Every label key must be present, with any value
    HasLabels(Vec<String>),
}

impl ListOption {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        ListOption::InNamespace(namespace.into())
    }

    pub fn matching_label(key: impl Into<String>, value: impl Into<String>) -> Self {
        ListOption::MatchingLabels(BTreeMap::from([(key.into(), value.into())]))
    }

    pub fn has_label(key: impl Into<String>) -> Self {
        ListOption::HasLabels(vec![key.into()])
    }
}

/// Label requirements gathered from a set of `ListOption`s
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector {
    equals: BTreeMap<String, String>,
    exists: Vec<String>,
}

impl LabelSelector {
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        let empty = BTreeMap::new();
        let labels = labels.unwrap_or(&empty);
        self.equals
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
            && self.exists.iter().all(|k| labels.contains_key(k))
    }
}

#[derive(Debug, Default)]
struct ResolvedOptions {
    namespace: Option<String>,
    selector: LabelSelector,
}

impl ResolvedOptions {
    fn from_options(options: &[ListOption]) -> Self {
        let mut resolved = Self::default();
        for option in options {
            match option {
                ListOption::InNamespace(ns) => resolved.namespace = Some(ns.clone()),
                ListOption::MatchingLabels(labels) => resolved
                    .selector
                    .equals
                    .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone()))),
                ListOption::HasLabels(keys) => {
                    resolved.selector.exists.extend(keys.iter().cloned())
                }
            }
        }
        resolved
    }
}

/// Read access to cluster objects, shaped like a Kubernetes client
#[async_trait]
pub trait Reader: Send + Sync {
    /// Fetch one object. Cluster scoped kinds take an empty namespace.
    async fn get<K: Registered>(&self, name: &str, namespace: &str) -> BundleResult<K>;

    /// List objects of a kind, in namespace then name order
    async fn list<K: Registered>(&self, options: &[ListOption]) -> BundleResult<Vec<K>>;
}

/// `Reader` backed by the in-memory bundle index
#[derive(Clone, Debug, Default)]
pub struct ObjectReader {
    storage: Storage,
}

impl ObjectReader {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Load a resource directory with every built-in kind registered
    pub fn from_dir(dir: &Path) -> BundleResult<Self> {
        Self::with_scheme(dir, &Scheme::default_kinds())
    }

    pub fn with_scheme(dir: &Path, scheme: &Scheme) -> BundleResult<Self> {
        Ok(Self::new(Storage::load(dir, scheme)?))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn get_object<K: Registered>(&self, name: &str, namespace: &str) -> BundleResult<K> {
        let gvk = gvk_of::<K>();
        let not_found = || BundleError::NotFound {
            gvk: gvk.clone(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        };

        let Some(collection) = self.storage.collection(&gvk) else {
            return Err(not_found());
        };

        let partition = match (collection.is_namespaced(), namespace.is_empty()) {
            (true, true) => {
                return Err(BundleError::Scope {
                    gvk: gvk.clone(),
                    scope: "namespaced",
                    namespace: namespace.to_string(),
                });
            }
            (false, false) => {
                return Err(BundleError::Scope {
                    gvk: gvk.clone(),
                    scope: "cluster scoped",
                    namespace: namespace.to_string(),
                });
            }
            (true, false) => collection.namespace(namespace),
            (false, true) => collection.cluster_scoped_objects(),
        };

        partition
            .and_then(|objects| objects.get(name))
            .and_then(K::from_object)
            .cloned()
            .ok_or_else(not_found)
    }

    pub fn list_objects<K: Registered>(&self, options: &[ListOption]) -> BundleResult<Vec<K>> {
        let gvk = gvk_of::<K>();
        let Some(collection) = self.storage.collection(&gvk) else {
            return Ok(Vec::new());
        };

        let options = ResolvedOptions::from_options(options);
        let objects: Vec<&KubeObject> = if collection.is_namespaced() {
            let partitions: Vec<&NamespaceObjects> = match &options.namespace {
                Some(ns) => collection.namespace(ns).into_iter().collect(),
                None => collection.all().collect(),
            };
            partitions
                .into_iter()
                .flat_map(NamespaceObjects::iter)
                .collect()
        } else {
            // Cluster scoped files can still hold namespaced objects, so the
            // namespace comes from each object's metadata here
            let mut objects: Vec<&KubeObject> = collection
                .cluster_scoped_objects()
                .into_iter()
                .flat_map(NamespaceObjects::iter)
                .filter(|object| {
                    options
                        .namespace
                        .as_deref()
                        .is_none_or(|ns| object.namespace() == ns)
                })
                .collect();
            objects.sort_by(|a, b| (a.namespace(), a.name()).cmp(&(b.namespace(), b.name())));
            objects
        };

        Ok(objects
            .into_iter()
            .filter(|object| options.selector.matches(object.labels()))
            .filter_map(|object| K::from_object(object))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Reader for ObjectReader {
    async fn get<K: Registered>(&self, name: &str, namespace: &str) -> BundleResult<K> {
        self.get_object(name, namespace)
    }

    async fn list<K: Registered>(&self, options: &[ListOption]) -> BundleResult<Vec<K>> {
        self.list_objects(options)
    }
}
