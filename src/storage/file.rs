//! FileStorage - JSON file backend
//!
//! TigerStyle: Whole-file snapshot, rewritten on every commit.
//!
//! # Layout
//!
//! ```text
//! {
//!   "Amenity.<id>": { "__class__": "Amenity", "id": ..., ... },
//!   "Place.<id>":   { "__class__": "Place", "amenity_ids": [...], ... }
//! }
//! ```
//!
//! Records of classes this service does not model (User, City, ...) are
//! kept verbatim so sharing the file with other tools never loses data.
//! Links live on the place record, so `Link`/`Unlink` changes are rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;

use super::backend::{Change, StorageBackend};
use super::error::{StorageError, StorageResult};
use crate::models::{storage_key, Entity, ModelKind};

// =============================================================================
// Objects
// =============================================================================

#[derive(Debug, Clone, Default)]
struct Objects {
    /// Entities of kinds this service models
    known: BTreeMap<String, Entity>,
    /// Everything else, preserved on write
    foreign: BTreeMap<String, Value>,
}

impl Objects {
    fn parse(bytes: &[u8]) -> StorageResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| StorageError::serialization(format!("invalid storage file: {e}")))?;

        let mut objects = Self::default();
        for (key, value) in raw {
            let class = value.get("__class__").and_then(Value::as_str);
            if class.and_then(ModelKind::from_str).is_none() {
                objects.foreign.insert(key, value);
                continue;
            }
            let entity: Entity = serde_json::from_value(value)
                .map_err(|e| StorageError::serialization(format!("invalid record {key}: {e}")))?;
            objects.known.insert(key, entity);
        }
        Ok(objects)
    }

    fn to_bytes(&self) -> StorageResult<Vec<u8>> {
        let mut raw: BTreeMap<&str, Value> = self
            .foreign
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        for (key, entity) in &self.known {
            let value = serde_json::to_value(entity)
                .map_err(|e| StorageError::serialization(format!("record {key}: {e}")))?;
            raw.insert(key.as_str(), value);
        }
        serde_json::to_vec(&raw).map_err(|e| StorageError::serialization(e.to_string()))
    }

    fn apply(&mut self, change: Change) -> StorageResult<()> {
        match change {
            Change::Upsert(entity) => {
                self.known.insert(entity.key(), entity);
            }
            Change::Delete { kind, id } => {
                self.known.remove(&storage_key(kind, &id));
            }
            Change::Link { .. } => {
                return Err(StorageError::Unsupported {
                    backend: "file",
                    operation: "join-table link",
                });
            }
            Change::Unlink { .. } => {
                return Err(StorageError::Unsupported {
                    backend: "file",
                    operation: "join-table unlink",
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// JSON file storage backend.
pub struct FileStorage {
    path: PathBuf,
    objects: RwLock<Objects>,
}

impl FileStorage {
    /// Open the storage file, loading it if present. The parent
    /// directory is created so later writes cannot fail on a missing path.
    ///
    /// # Errors
    /// Returns error if the parent directory cannot be created, or the
    /// file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::write(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let storage = Self {
            path,
            objects: RwLock::new(Objects::default()),
        };
        storage.reload().await?;
        Ok(storage)
    }

    /// Replace in-memory objects with the file's contents.
    /// A missing file loads as empty.
    async fn reload(&self) -> StorageResult<()> {
        let loaded = match fs::read(&self.path).await {
            Ok(bytes) => Objects::parse(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Objects::default(),
            Err(e) => {
                return Err(StorageError::read(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        tracing::debug!(
            path = %self.path.display(),
            objects = loaded.known.len(),
            foreign = loaded.foreign.len(),
            "file storage loaded"
        );
        *self.objects.write().await = loaded;
        Ok(())
    }

    async fn persist(&self, objects: &Objects) -> StorageResult<()> {
        let bytes = objects.to_bytes()?;

        // Write then rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::write(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            StorageError::write(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, kind: ModelKind, id: &str) -> StorageResult<Option<Entity>> {
        let objects = self.objects.read().await;
        Ok(objects.known.get(&storage_key(kind, id)).cloned())
    }

    async fn all(&self, kind: Option<ModelKind>) -> StorageResult<Vec<Entity>> {
        let objects = self.objects.read().await;
        Ok(objects
            .known
            .values()
            .filter(|e| kind.map_or(true, |k| e.kind() == k))
            .cloned()
            .collect())
    }

    async fn count(&self, kind: Option<ModelKind>) -> StorageResult<usize> {
        let objects = self.objects.read().await;
        Ok(objects
            .known
            .values()
            .filter(|e| kind.map_or(true, |k| e.kind() == k))
            .count())
    }

    async fn commit(&self, changes: Vec<Change>) -> StorageResult<()> {
        // Hold the write lock across the file write so commits serialize
        let mut objects = self.objects.write().await;

        // Apply to a copy so a rejected batch leaves memory untouched
        let mut next = objects.clone();
        for change in changes {
            next.apply(change)?;
        }

        self.persist(&next).await?;
        *objects = next;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
