//! Generated audio artifact store
//!
//! Artifacts live as `output_<id>.wav` in one flat directory:
//! - `create` writes a temp file in the same directory and renames it into
//!   place, so `get` never sees a partial file
//! - `get` and `delete` on the same id are serialized by a per-id lock
//! - ids are `ArtifactId`s, which only parse from canonical UUIDs, so a path
//!   built from one cannot leave the directory

use chrono::Utc;
use dashmap::DashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use store_assistant_core::{ArtifactId, AudioArtifact};
use tokio::sync::RwLock;

use crate::error::PersistenceError;

/// File-backed artifact store
pub struct AudioArtifactStore {
    root: PathBuf,
    locks: DashMap<ArtifactId, Arc<RwLock<()>>>,
}

impl AudioArtifactStore {
    /// Open the store, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| PersistenceError::ArtifactIo(format!("{}: {}", root.display(), e)))?;
        tracing::info!(root = %root.display(), "Artifact store ready");
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(id.file_name())
    }

    fn lock_for(&self, id: &ArtifactId) -> Arc<RwLock<()>> {
        self.locks
            .entry(*id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .value()
            .clone()
    }

    /// Drop the lock entry if nobody else holds it
    fn forget_if_idle(&self, id: &ArtifactId) {
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Persist `audio` under a fresh id
    pub async fn create(&self, audio: Vec<u8>) -> Result<AudioArtifact, PersistenceError> {
        if audio.is_empty() {
            return Err(PersistenceError::ArtifactIo("refusing to store empty audio".to_string()));
        }

        let id = ArtifactId::new();
        let path = self.path_for(&id);
        let size = audio.len();

        let lock = self.lock_for(&id);
        let result = {
            let _guard = lock.write().await;
            let root = self.root.clone();
            let target = path.clone();
            tokio::task::spawn_blocking(move || write_atomic(&root, &target, &audio)).await
        };
        drop(lock);
        self.forget_if_idle(&id);
        result??;

        tracing::debug!(artifact_id = %id, bytes = size, "Stored audio artifact");

        Ok(AudioArtifact {
            id,
            file_path: path,
            created_at: Utc::now(),
        })
    }

    /// Read an artifact's bytes
    pub async fn get(&self, id: &ArtifactId) -> Result<Vec<u8>, PersistenceError> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.read().await;
            tokio::fs::read(self.path_for(id)).await
        };
        drop(lock);

        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.forget_if_idle(id);
                Err(PersistenceError::ArtifactNotFound(id.to_string()))
            }
            Err(e) => Err(PersistenceError::ArtifactIo(format!("read {}: {}", id, e))),
        }
    }

    /// Remove an artifact. Deleting a missing id fails with `ArtifactNotFound`.
    pub async fn delete(&self, id: &ArtifactId) -> Result<(), PersistenceError> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.write().await;
            tokio::fs::remove_file(self.path_for(id)).await
        };
        drop(lock);
        self.forget_if_idle(id);

        match result {
            Ok(()) => {
                tracing::debug!(artifact_id = %id, "Deleted audio artifact");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::ArtifactNotFound(id.to_string()))
            }
            Err(e) => Err(PersistenceError::ArtifactIo(format!("delete {}: {}", id, e))),
        }
    }

    /// Delete every artifact last modified more than `age` ago
    ///
    /// Goes through `delete`, so it serializes with concurrent readers.
    pub async fn purge_older_than(&self, age: Duration) -> Result<usize, PersistenceError> {
        let cutoff = SystemTime::now()
            .checked_sub(age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| PersistenceError::ArtifactIo(format!("{}: {}", self.root.display(), e)))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PersistenceError::ArtifactIo(e.to_string()))?
        {
            let Some(id) = entry.file_name().to_str().and_then(ArtifactId::from_file_name) else {
                continue;
            };

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(artifact_id = %id, error = %e, "Skipping artifact without mtime");
                    continue;
                }
            };

            if modified <= cutoff {
                match self.delete(&id).await {
                    Ok(()) => removed += 1,
                    // Deleted concurrently
                    Err(PersistenceError::ArtifactNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Purged expired audio artifacts");
        }
        Ok(removed)
    }
}

/// Write to a temp file in `dir`, then rename onto `target`
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| PersistenceError::ArtifactIo(format!("temp file in {}: {}", dir.display(), e)))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PersistenceError::ArtifactIo(format!("write: {}", e)))?;
    tmp.persist(target)
        .map_err(|e| PersistenceError::ArtifactIo(format!("rename to {}: {}", target.display(), e.error)))?;
    Ok(())
}
