//! GVK object index
//!
//! Loads the `cluster-resources` tree of a support bundle into memory, keyed
//! by GroupVersionKind, then namespace, then name. The index is built once
//! and is read-only afterwards.
//!
//! Layout understood by the loader:
//!
//! ```text
//! cluster-resources/
//!   nodes.json                  core, cluster scoped, List envelope
//!   pods/<namespace>.json       core, namespaced, List envelope per namespace
//!   custom-resources/
//!     <plural>.<group>.json     custom, cluster scoped, bare array
//!     <plural>.<group>/<ns>.json custom, namespaced, bare array per namespace
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use kube::Resource;
use kube::core::GroupVersionKind;
use serde::Deserialize;
use serde_json::Value;

use super::error::{BundleError, BundleResult, gvk_display};
use super::scheme::{KubeObject, Registered, Scheme, gvk_from_api_version, gvk_of};

/// Directory holding custom resources inside the resource root
pub const CUSTOM_RESOURCES_DIR: &str = "custom-resources";

const IGNORED_FILES: &[&str] = &[
    "custom-resource-definitions.json",
    "groups.json",
    "resources.json",
];

const IGNORED_FOLDERS: &[&str] = &["auth-cani-list", "image-pull-secrets"];

/// Objects of one namespace (or of the cluster scope), ordered by name
#[derive(Clone, Debug, Default)]
pub struct NamespaceObjects {
    namespace: String,
    objects: BTreeMap<String, KubeObject>,
}

impl NamespaceObjects {
    fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            objects: BTreeMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, name: &str) -> Option<&KubeObject> {
        self.objects.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KubeObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// All objects of one GVK, partitioned by namespace
#[derive(Clone, Debug)]
pub struct Collection {
    namespaced: bool,
    gvk: GroupVersionKind,
    by_namespace: BTreeMap<String, NamespaceObjects>,
}

impl Collection {
    fn new(gvk: GroupVersionKind, namespaced: bool) -> Self {
        Self {
            namespaced,
            gvk,
            by_namespace: BTreeMap::new(),
        }
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// Objects of a namespace.
    ///
    /// # Panics
    ///
    /// Panics when called on a cluster scoped collection.
    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceObjects> {
        assert!(
            self.namespaced,
            "{} is cluster scoped, use cluster_scoped_objects()",
            gvk_display(&self.gvk)
        );
        self.by_namespace.get(namespace)
    }

    /// Objects of a cluster scoped collection.
    ///
    /// # Panics
    ///
    /// Panics when called on a namespaced collection.
    pub fn cluster_scoped_objects(&self) -> Option<&NamespaceObjects> {
        assert!(
            !self.namespaced,
            "{} is namespaced, use namespace()",
            gvk_display(&self.gvk)
        );
        self.by_namespace.get("")
    }

    /// Every partition, in namespace order
    pub fn all(&self) -> impl Iterator<Item = &NamespaceObjects> {
        self.by_namespace.values()
    }

    pub fn object_count(&self) -> usize {
        self.by_namespace.values().map(NamespaceObjects::len).sum()
    }

    fn insert(&mut self, namespace: &str, object: KubeObject) {
        let name = object.name().to_string();
        self.by_namespace
            .entry(namespace.to_string())
            .or_insert_with(|| NamespaceObjects::new(namespace))
            .objects
            .insert(name, object);
    }
}

/// The loaded index
#[derive(Clone, Debug, Default)]
pub struct Storage {
    by_gvk: HashMap<GroupVersionKind, Collection>,
}

impl Storage {
    /// Scan `dir` and decode every file whose kind is registered in `scheme`
    pub fn load(dir: &Path, scheme: &Scheme) -> BundleResult<Self> {
        let layout = Layout::scan(dir)?;
        let mut storage = Storage::default();

        for file in &layout.core_files {
            let (gvk, objects) = read_list_file(file, scheme)?;
            storage.add(gvk, false, "", objects, file)?;
        }

        for folder in &layout.core_folders {
            storage.load_folder(folder, scheme, read_list_file_optional)?;
        }

        for file in &layout.custom_files {
            if let Some((gvk, objects)) = read_custom_file(file, scheme)? {
                storage.add(gvk, false, "", objects, file)?;
            }
        }

        for folder in &layout.custom_folders {
            storage.load_folder(folder, scheme, read_custom_file)?;
        }

        tracing::info!(
            "Loaded {} objects of {} kinds from {}",
            storage.object_count(),
            storage.by_gvk.len(),
            dir.display()
        );

        Ok(storage)
    }

    /// Add a typed object, scoped by the namespace in its metadata
    pub fn insert<K: Registered>(&mut self, object: K) -> BundleResult<()> {
        let namespace = object.meta().namespace.clone().unwrap_or_default();
        let namespaced = !namespace.is_empty();
        self.add(
            gvk_of::<K>(),
            namespaced,
            &namespace,
            vec![object.into_object()],
            Path::new("<memory>"),
        )
    }

    pub fn collection(&self, gvk: &GroupVersionKind) -> Option<&Collection> {
        self.by_gvk.get(gvk)
    }

    pub fn object_count(&self) -> usize {
        self.by_gvk.values().map(Collection::object_count).sum()
    }

    fn load_folder(
        &mut self,
        folder: &Path,
        scheme: &Scheme,
        read: fn(&Path, &Scheme) -> BundleResult<Option<Decoded>>,
    ) -> BundleResult<()> {
        let mut folder_gvk: Option<GroupVersionKind> = None;

        for file in json_files(folder)? {
            let Some((gvk, objects)) = read(&file, scheme)? else {
                continue;
            };

            match &folder_gvk {
                Some(expected) if *expected != gvk => {
                    return Err(BundleError::schema(
                        &file,
                        format!(
                            "holds {} but other files in the folder hold {}",
                            gvk_display(&gvk),
                            gvk_display(expected)
                        ),
                    ));
                }
                Some(_) => {}
                None => folder_gvk = Some(gvk.clone()),
            }

            let namespace = namespace_from_file(&file);
            self.add(gvk, true, &namespace, objects, &file)?;
        }

        if folder_gvk.is_none() {
            tracing::debug!("No known resources in {}", folder.display());
        }

        Ok(())
    }

    fn add(
        &mut self,
        gvk: GroupVersionKind,
        namespaced: bool,
        namespace: &str,
        objects: Vec<KubeObject>,
        source: &Path,
    ) -> BundleResult<()> {
        let collection = self
            .by_gvk
            .entry(gvk.clone())
            .or_insert_with(|| Collection::new(gvk, namespaced));

        if collection.namespaced != namespaced {
            return Err(BundleError::schema(
                source,
                format!(
                    "{} is loaded both as namespaced and as cluster scoped",
                    gvk_display(&collection.gvk)
                ),
            ));
        }

        for object in objects {
            collection.insert(namespace, object);
        }
        Ok(())
    }
}

type Decoded = (GroupVersionKind, Vec<KubeObject>);

/// Entries of the resource root, classified
#[derive(Debug, Default)]
struct Layout {
    core_files: Vec<PathBuf>,
    core_folders: Vec<PathBuf>,
    custom_files: Vec<PathBuf>,
    custom_folders: Vec<PathBuf>,
}

impl Layout {
    fn scan(dir: &Path) -> BundleResult<Self> {
        let mut layout = Layout::default();

        for entry in sorted_entries(dir)? {
            let name = file_name(&entry);
            if entry.is_dir() {
                if name == CUSTOM_RESOURCES_DIR {
                    layout.scan_custom(&entry)?;
                } else if IGNORED_FOLDERS.contains(&name.as_str()) {
                    tracing::debug!("Ignoring folder {}", entry.display());
                } else {
                    layout.core_folders.push(entry);
                }
            } else if is_resource_file(&name) {
                layout.core_files.push(entry);
            } else {
                tracing::debug!("Ignoring file {}", entry.display());
            }
        }

        Ok(layout)
    }

    fn scan_custom(&mut self, dir: &Path) -> BundleResult<()> {
        for entry in sorted_entries(dir)? {
            if entry.is_dir() {
                self.custom_folders.push(entry);
            } else if is_resource_file(&file_name(&entry)) {
                self.custom_files.push(entry);
            } else {
                tracing::debug!("Ignoring file {}", entry.display());
            }
        }
        Ok(())
    }
}

/// Whether a file name looks like a resource dump the loader should read
pub fn is_resource_file(name: &str) -> bool {
    name.ends_with(".json") && !name.ends_with("-errors.json") && !IGNORED_FILES.contains(&name)
}

/// Singular kind of a List kind: `PodList` -> `Pod`
pub fn trim_list_from_kind(kind: &str) -> Option<&str> {
    kind.strip_suffix("List").filter(|k| !k.is_empty())
}

fn sorted_entries(dir: &Path) -> BundleResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| BundleError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| BundleError::io(dir, e))?;
    entries.sort();
    Ok(entries)
}

/// Resource files directly inside a namespaced folder; nested folders are skipped
fn json_files(folder: &Path) -> BundleResult<Vec<PathBuf>> {
    Ok(sorted_entries(folder)?
        .into_iter()
        .filter(|path| {
            if path.is_dir() {
                tracing::debug!("Ignoring nested folder {}", path.display());
                return false;
            }
            is_resource_file(&file_name(path))
        })
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn namespace_from_file(path: &Path) -> String {
    let name = file_name(path);
    name.strip_suffix(".json").unwrap_or(&name).to_string()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> BundleResult<T> {
    let bytes = fs::read(path).map_err(|e| BundleError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| BundleError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEnvelope {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    items: Vec<Value>,
}

fn read_list_file_optional(path: &Path, scheme: &Scheme) -> BundleResult<Option<Decoded>> {
    read_list_file(path, scheme).map(Some)
}

/// Core resources: `{apiVersion, kind: "<Kind>List", items}`
fn read_list_file(path: &Path, scheme: &Scheme) -> BundleResult<Decoded> {
    let list: ListEnvelope = read_json(path)?;

    let Some(kind) = trim_list_from_kind(&list.kind) else {
        return Err(BundleError::schema(
            path,
            format!("kind {:?} is not a list", list.kind),
        ));
    };
    let gvk = gvk_from_api_version(&list.api_version, kind);

    let Some(decoder) = scheme.decoder(&gvk) else {
        return Err(BundleError::schema(
            path,
            format!("unknown kind {}", gvk_display(&gvk)),
        ));
    };

    let objects = list
        .items
        .into_iter()
        .map(|mut item| {
            if let Value::Object(fields) = &mut item {
                fields
                    .entry("apiVersion")
                    .or_insert_with(|| Value::String(list.api_version.clone()));
                fields
                    .entry("kind")
                    .or_insert_with(|| Value::String(gvk.kind.clone()));
            }
            decoder(item)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| BundleError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok((gvk, objects))
}

/// Custom resources: a bare array, typed by its first element
fn read_custom_file(path: &Path, scheme: &Scheme) -> BundleResult<Option<Decoded>> {
    let items: Vec<Value> = read_json(path)?;

    let Some(first) = items.first() else {
        return Err(BundleError::schema(path, "empty custom resource file"));
    };
    let api_version = first
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind = first.get("kind").and_then(Value::as_str).unwrap_or_default();
    let gvk = gvk_from_api_version(api_version, kind);

    let Some(decoder) = scheme.decoder(&gvk) else {
        tracing::debug!(
            "Skipping {}: {} is not a known kind",
            path.display(),
            gvk_display(&gvk)
        );
        return Ok(None);
    };

    let objects = items
        .into_iter()
        .map(decoder)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| BundleError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some((gvk, objects)))
}
