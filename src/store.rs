//! Durable record-set storage.
//!
//! Each concern persists one named record set as a JSON snapshot. Every
//! save is a full overwrite written to a temporary sibling and renamed
//! into place, so a crash mid-write preserves the prior complete snapshot.
//! All keys are stored as text; numeric identifiers are converted at the
//! boundary.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode record set: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("corrupt record set '{name}': {source}")]
    Corrupt {
        name: String,
        source: serde_json::Error,
    },
}

/// Snapshot store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open (and create if needed) the data directory.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load a named record set.
    ///
    /// A missing snapshot yields the default (empty) value rather than an
    /// error. An unparsable snapshot is surfaced as [`StoreError::Corrupt`]
    /// so an operator can intervene instead of silently losing state.
    pub async fn load<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        match tokio::fs::read(self.path(name)).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                name: name.to_string(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(record_set = name, "No existing snapshot, starting fresh");
                Ok(T::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save a named record set as a full overwrite.
    ///
    /// The new content becomes visible only after the rename; a failed
    /// write never truncates the previous snapshot.
    pub async fn save<T>(&self, name: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = self.dir.join(format!("{name}.json.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, self.path(name)).await?;
        debug!(record_set = name, bytes = bytes.len(), "Snapshot saved");
        Ok(())
    }
}
