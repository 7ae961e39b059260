//! JSON snapshot files with atomic replacement.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Outcome of reading a snapshot file.
#[derive(Debug)]
pub enum Snapshot<T> {
    /// File does not exist yet.
    Missing,
    Loaded(T),
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Sibling path used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read and deserialize `path`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Snapshot<T>, StoreError> {
    let content = match fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::Missing),
        Err(e) => return Err(io_error(path, e)),
    };

    serde_json::from_str(&content)
        .map(Snapshot::Loaded)
        .map_err(|source| StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize `value` and replace `path` atomically.
///
/// Writes a temporary sibling, syncs it, then renames over the target, so
/// readers see either the old file or the complete new one.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    let tmp = temp_path(path);
    {
        let mut file = fs::File::create(&tmp).await.map_err(|e| io_error(&tmp, e))?;
        file.write_all(&payload)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        file.sync_all().await.map_err(|e| io_error(&tmp, e))?;
    }

    fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))
}
