//! Support bundle access
//!
//! A support bundle is a point-in-time capture of a cluster: JSON dumps of
//! its resources under `cluster-resources/` and container logs under
//! `logs/`. This module loads the dumps into a typed index and exposes it
//! through a Kubernetes-client shaped `Reader`, plus a `PodLogsReader` over
//! the captured logs.

pub mod archive;
pub mod error;
pub mod logs;
pub mod reader;
pub mod scheme;
pub mod storage;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub use error::{BundleError, BundleResult};
pub use logs::{FsLogsReader, LineFilter, PodLogsReader, contains};
pub use reader::{LabelSelector, ListOption, ObjectReader, Reader};
pub use scheme::{KubeObject, Registered, Scheme, gvk_of};
pub use storage::{Collection, NamespaceObjects, Storage};

/// Resource dumps, relative to the bundle root
pub const RESOURCES_DIR: &str = "cluster-resources";

/// Container logs, relative to the bundle root
pub const LOGS_DIR: &str = "logs";

/// An opened support bundle
#[derive(Debug)]
pub struct Bundle {
    root: PathBuf,
    reader: ObjectReader,
    logs: FsLogsReader,
    // Keeps an extracted archive on disk for as long as the bundle lives.
    _extracted: Option<TempDir>,
}

impl Bundle {
    /// Open a bundle directory or a `.tar.gz` / `.tgz` archive
    pub fn open(path: &Path) -> BundleResult<Self> {
        Self::open_with_scheme(path, &Scheme::default_kinds())
    }

    pub fn open_with_scheme(path: &Path, scheme: &Scheme) -> BundleResult<Self> {
        let (root, extracted) = if path.is_file() && archive::is_archive(path) {
            let dir = archive::extract(path)?;
            (archive::bundle_root(dir.path())?, Some(dir))
        } else {
            (path.to_path_buf(), None)
        };

        let resources = root.join(RESOURCES_DIR);
        let resources = if resources.is_dir() {
            resources
        } else {
            tracing::debug!(
                "No {} directory in {}, reading resources from the bundle root",
                RESOURCES_DIR,
                root.display()
            );
            root.clone()
        };

        let reader = ObjectReader::with_scheme(&resources, scheme)?;
        let logs = FsLogsReader::new(root.join(LOGS_DIR));

        Ok(Self {
            root,
            reader,
            logs,
            _extracted: extracted,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reader(&self) -> &ObjectReader {
        &self.reader
    }

    pub fn logs(&self) -> &FsLogsReader {
        &self.logs
    }
}
