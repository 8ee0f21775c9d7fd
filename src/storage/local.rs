//! Local filesystem storage implementation.
//!
//! Every write goes to a uniquely named sibling temp file which is flushed,
//! synced and then renamed over the target, so a concurrent reader observes
//! either the previous document or the new one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::pipeline::RunReport;
use crate::storage::{REPORT_FILE, SNAPSHOT_FILE, SnapshotStore};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    fn tmp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let unique = format!(
            ".{}.{}.{}.tmp",
            name,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        path.with_file_name(unique)
    }

    /// Write bytes atomically (write to temp, sync, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::persistence(&path, e))?;
        }

        let tmp = Self::tmp_path(&path);
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                log::debug!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(AppError::persistence(&path, e));
        }
        Ok(())
    }

    /// Write pretty-printed JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::persistence(self.path(key), e))?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let Some(bytes) = self.read_bytes(SNAPSHOT_FILE).await? else {
            log::info!("No {} found, starting fresh", SNAPSHOT_FILE);
            return Ok(None);
        };

        match Snapshot::from_json(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable {}: {}. Starting fresh.",
                    self.path(SNAPSHOT_FILE).display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_json(SNAPSHOT_FILE, snapshot).await
    }

    async fn save_report(&self, report: &RunReport) -> Result<()> {
        self.write_json(REPORT_FILE, report).await
    }

    fn snapshot_location(&self) -> String {
        self.path(SNAPSHOT_FILE).display().to_string()
    }
}
