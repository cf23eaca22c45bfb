//! Pod log reader
//!
//! Container logs are captured as `logs/<namespace>/<pod>/<container>.log`.
//! A deployment's logs are the logs of every pod whose directory name starts
//! with the deployment name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::{BundleError, BundleResult};

/// Line predicate; a line is kept only when every filter accepts it
pub type LineFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Filter accepting lines that contain `needle`
pub fn contains(needle: impl Into<String>) -> LineFilter {
    let needle = needle.into();
    Box::new(move |line: &str| line.contains(&needle))
}

/// Source of pod logs for a deployment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PodLogsReader: Send + Sync {
    /// Matching lines of every pod of the deployment, pods in name order,
    /// lines in file order
    async fn logs_from_deployment(
        &self,
        name: &str,
        namespace: &str,
        filters: &[LineFilter],
    ) -> BundleResult<Vec<String>>;
}

/// `PodLogsReader` over the `logs` directory of an extracted bundle
#[derive(Clone, Debug)]
pub struct FsLogsReader {
    root: PathBuf,
}

impl FsLogsReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_pod_log(
        &self,
        pod_dir: &Path,
        filters: &[LineFilter],
    ) -> BundleResult<Vec<String>> {
        let files: Vec<PathBuf> = sorted_entries(pod_dir)
            .await?
            .into_iter()
            .filter(|(_, is_dir)| !is_dir)
            .map(|(path, _)| path)
            .collect();

        let file = match files.as_slice() {
            [] => {
                tracing::warn!("No log file in {}, skipping", pod_dir.display());
                return Ok(Vec::new());
            }
            [file] => file,
            _ => {
                return Err(BundleError::UnsupportedLogFormat {
                    path: pod_dir.to_path_buf(),
                    files: files.len(),
                });
            }
        };

        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| BundleError::io(file, e))?;

        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| filters.iter().all(|accept| accept(line)))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl PodLogsReader for FsLogsReader {
    async fn logs_from_deployment(
        &self,
        name: &str,
        namespace: &str,
        filters: &[LineFilter],
    ) -> BundleResult<Vec<String>> {
        let namespace_dir = self.root.join(namespace);
        let mut lines = Vec::new();

        for (pod_dir, is_dir) in sorted_entries(&namespace_dir).await? {
            let pod_name = pod_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !is_dir || !pod_name.starts_with(name) {
                continue;
            }

            tracing::debug!("Reading logs of pod {}/{}", namespace, pod_name);
            lines.extend(self.read_pod_log(&pod_dir, filters).await?);
        }

        Ok(lines)
    }
}

/// Directory entries as `(path, is_dir)`, sorted by path
async fn sorted_entries(dir: &Path) -> BundleResult<Vec<(PathBuf, bool)>> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| BundleError::io(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| BundleError::io(dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| BundleError::io(entry.path(), e))?;
        entries.push((entry.path(), file_type.is_dir()));
    }
    entries.sort();
    Ok(entries)
}
