use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::fs::operations::{read_locked, replace_file};

use super::entities::SnapshotEntity;

pub const SNAPSHOT_FILE_NAME: &str = "screentime.json";

/// Interface for abstracting storage of the usage snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Reads the stored snapshot. `None` means nothing was stored yet.
    async fn read(&self) -> Result<Option<SnapshotEntity>>;

    /// Replaces the stored snapshot. On failure the previous snapshot must stay readable.
    async fn write(&self, snapshot: &SnapshotEntity) -> Result<()>;
}

/// The main realization of [SnapshotStorage]. Keeps the snapshot as pretty printed JSON.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStorage {
    path: PathBuf,
}

impl JsonSnapshotStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage for `dir/screentime.json`.
    pub fn in_dir(dir: PathBuf) -> Self {
        Self::new(dir.join(SNAPSHOT_FILE_NAME))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SnapshotStorage for JsonSnapshotStorage {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn read(&self) -> Result<Option<SnapshotEntity>> {
        let Some(contents) = read_locked(&self.path).await? else {
            debug!("No snapshot stored yet");
            return Ok(None);
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_str::<SnapshotEntity>(&contents)
            .with_context(|| format!("Snapshot {:?} is corrupted", self.path))?;
        Ok(Some(snapshot))
    }

    #[instrument(skip(self, snapshot), fields(path = ?self.path))]
    async fn write(&self, snapshot: &SnapshotEntity) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(snapshot)?;
        replace_file(&self.path, &buffer)
            .await
            .with_context(|| format!("Failed to write snapshot {:?}", self.path))?;
        debug!(bytes = buffer.len(), "Snapshot written");
        Ok(())
    }
}
