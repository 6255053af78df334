//! Session - per-request storage handle
//!
//! Reads go straight to the backend. Writes are buffered until `save()`.
//! Dropping a session closes it, so every request path releases it.

use std::sync::Arc;

use super::backend::{Change, StorageBackend};
use super::error::{StorageError, StorageResult};
use crate::models::{Amenity, Entity, ModelKind, Place};

/// Per-request storage handle.
pub struct Session {
    backend: Arc<dyn StorageBackend>,
    pending: Vec<Change>,
    closed: bool,
}

impl Session {
    /// Open a session against a shared backend.
    #[must_use]
    pub fn open(backend: Arc<dyn StorageBackend>) -> Self {
        tracing::trace!(backend = backend.name(), "session opened");
        Self {
            backend,
            pending: Vec::new(),
            closed: false,
        }
    }

    /// Look up an entity by kind and id. An empty id never resolves.
    pub async fn get(&self, kind: ModelKind, id: &str) -> StorageResult<Option<Entity>> {
        if id.is_empty() {
            return Ok(None);
        }
        self.backend.get(kind, id).await
    }

    /// Look up a place.
    pub async fn get_place(&self, id: &str) -> StorageResult<Option<Place>> {
        Ok(self
            .get(ModelKind::Place, id)
            .await?
            .and_then(Entity::into_place))
    }

    /// Look up an amenity.
    pub async fn get_amenity(&self, id: &str) -> StorageResult<Option<Amenity>> {
        Ok(self
            .get(ModelKind::Amenity, id)
            .await?
            .and_then(Entity::into_amenity))
    }

    /// List entities, optionally of one kind.
    pub async fn all(&self, kind: Option<ModelKind>) -> StorageResult<Vec<Entity>> {
        self.backend.all(kind).await
    }

    /// Count entities, optionally of one kind.
    pub async fn count(&self, kind: Option<ModelKind>) -> StorageResult<usize> {
        self.backend.count(kind).await
    }

    /// Stage an insert or replace.
    pub fn add(&mut self, entity: impl Into<Entity>) {
        self.stage(Change::Upsert(entity.into()));
    }

    /// Stage a delete.
    pub fn delete(&mut self, kind: ModelKind, id: &str) {
        self.stage(Change::Delete {
            kind,
            id: id.to_string(),
        });
    }

    /// Stage an arbitrary change.
    pub fn stage(&mut self, change: Change) {
        assert!(!self.closed, "cannot stage changes on a closed session");
        self.pending.push(change);
    }

    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Commit all staged changes.
    ///
    /// # Errors
    /// Returns the backend's error if the commit fails. Staged changes
    /// are consumed either way.
    pub async fn save(&mut self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::internal("session already closed"));
        }
        if self.pending.is_empty() {
            return Ok(());
        }

        let changes = std::mem::take(&mut self.pending);
        let count = changes.len();
        self.backend.commit(changes).await?;

        tracing::debug!(backend = self.backend.name(), changes = count, "session saved");
        Ok(())
    }

    /// Release the session, discarding unsaved changes. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if !self.pending.is_empty() {
            tracing::warn!(
                backend = self.backend.name(),
                discarded = self.pending.len(),
                "session closed with unsaved changes"
            );
            self.pending.clear();
        }
        self.closed = true;
        tracing::trace!(backend = self.backend.name(), "session closed");
    }

}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Tests
// =============================================================================
