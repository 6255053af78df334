//! StorageBackend - the contract both backends implement

use async_trait::async_trait;

use super::error::StorageResult;
use crate::models::{Entity, ModelKind};

/// A mutation staged by a [`Session`](super::Session) until save.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert or replace an entity
    Upsert(Entity),
    /// Remove an entity
    Delete { kind: ModelKind, id: String },
    /// Add a place/amenity row to the join table
    Link { place_id: String, amenity_id: String },
    /// Remove a place/amenity row from the join table
    Unlink { place_id: String, amenity_id: String },
}

/// Uniform lookup and persistence over model entities.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Look up one entity. `Ok(None)` means not found.
    async fn get(&self, kind: ModelKind, id: &str) -> StorageResult<Option<Entity>>;

    /// List entities, optionally restricted to one kind.
    async fn all(&self, kind: Option<ModelKind>) -> StorageResult<Vec<Entity>>;

    /// Count entities, optionally restricted to one kind.
    async fn count(&self, kind: Option<ModelKind>) -> StorageResult<usize> {
        Ok(self.all(kind).await?.len())
    }

    /// Apply a batch of staged changes.
    async fn commit(&self, changes: Vec<Change>) -> StorageResult<()>;

    /// Release backend-wide resources at shutdown.
    async fn close(&self) {}
}
