//! Bundle archive extraction

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;

use super::error::{BundleError, BundleResult};

/// Whether `path` names a gzipped tarball (`.tar.gz` or `.tgz`)
pub fn is_archive(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Extract a `.tar.gz` bundle into a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn extract(archive: &Path) -> BundleResult<TempDir> {
    let archive_err = |source: std::io::Error| BundleError::Archive {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| BundleError::io(archive, e))?;
    let dir = tempfile::Builder::new()
        .prefix("bundlediag-")
        .tempdir()
        .map_err(archive_err)?;

    tar::Archive::new(GzDecoder::new(file))
        .unpack(dir.path())
        .map_err(archive_err)?;

    tracing::debug!("Extracted {} to {}", archive.display(), dir.path().display());
    Ok(dir)
}

/// Bundles are usually archived with a single top-level directory; descend
/// into it when that is the case
pub fn bundle_root(extracted: &Path) -> BundleResult<PathBuf> {
    let entries = std::fs::read_dir(extracted)
        .map_err(|e| BundleError::io(extracted, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| BundleError::io(extracted, e))?;

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Ok(extracted.to_path_buf()),
    }
}
