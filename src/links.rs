//! Place/Amenity Links
//!
//! TigerStyle: One capability set, one implementation per backend.
//!
//! ```text
//!                  AmenityLinks
//!        list / exists / attach / detach
//!            ↑                      ↑
//!   ┌────────┴────────┐   ┌────────┴────────┐
//!   │   IdListLinks   │   │ JoinTableLinks  │
//!   │ place.amenity_ids│   │  place_amenity  │
//!   └─────────────────┘   └─────────────────┘
//! ```
//!
//! `attach` and `detach` only stage changes on the session; callers decide
//! when to `save()`. Both variants must agree on whether a pair is linked
//! after the same sequence of operations.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::models::{Amenity, Place};
use crate::storage::{Change, DbStorage, Session, StorageResult};

/// Link operations for the Place↔Amenity relation.
#[async_trait]
pub trait AmenityLinks: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Amenities currently linked to `place`.
    async fn list(&self, session: &Session, place: &Place) -> StorageResult<Vec<Amenity>>;

    /// Whether `amenity` is linked to `place`.
    async fn exists(
        &self,
        session: &Session,
        place: &Place,
        amenity: &Amenity,
    ) -> StorageResult<bool>;

    /// Stage a new link.
    fn attach(&self, session: &mut Session, place: &mut Place, amenity: &Amenity);

    /// Stage removal of a link.
    fn detach(&self, session: &mut Session, place: &mut Place, amenity: &Amenity);
}

// =============================================================================
// IdListLinks
// =============================================================================

/// Links kept as an id list on the place record (file backend).
#[derive(Debug, Default, Clone, Copy)]
pub struct IdListLinks;

#[async_trait]
impl AmenityLinks for IdListLinks {
    fn name(&self) -> &'static str {
        "id_list"
    }

    async fn list(&self, session: &Session, place: &Place) -> StorageResult<Vec<Amenity>> {
        let lookups = place.amenity_ids.iter().map(|id| session.get_amenity(id));
        let resolved = try_join_all(lookups).await?;

        let mut amenities = Vec::with_capacity(resolved.len());
        for (id, amenity) in place.amenity_ids.iter().zip(resolved) {
            match amenity {
                Some(amenity) => amenities.push(amenity),
                None => tracing::warn!(
                    place_id = %place.id,
                    amenity_id = %id,
                    "skipping link to missing amenity"
                ),
            }
        }
        Ok(amenities)
    }

    async fn exists(
        &self,
        _session: &Session,
        place: &Place,
        amenity: &Amenity,
    ) -> StorageResult<bool> {
        Ok(place.amenity_ids.contains(&amenity.id))
    }

    fn attach(&self, session: &mut Session, place: &mut Place, amenity: &Amenity) {
        place.amenity_ids.push(amenity.id.clone());
        session.add(place.clone());
    }

    fn detach(&self, session: &mut Session, place: &mut Place, amenity: &Amenity) {
        place.amenity_ids.retain(|id| id != &amenity.id);
        session.add(place.clone());
    }
}

// =============================================================================
// JoinTableLinks
// =============================================================================

/// Links kept as rows of the `place_amenity` join table (db backend).
pub struct JoinTableLinks {
    db: Arc<DbStorage>,
}

impl JoinTableLinks {
    #[must_use]
    pub fn new(db: Arc<DbStorage>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AmenityLinks for JoinTableLinks {
    fn name(&self) -> &'static str {
        "join_table"
    }

    async fn list(&self, _session: &Session, place: &Place) -> StorageResult<Vec<Amenity>> {
        self.db.amenities_of(&place.id).await
    }

    async fn exists(
        &self,
        _session: &Session,
        place: &Place,
        amenity: &Amenity,
    ) -> StorageResult<bool> {
        self.db.is_linked(&place.id, &amenity.id).await
    }

    fn attach(&self, session: &mut Session, place: &mut Place, amenity: &Amenity) {
        session.stage(Change::Link {
            place_id: place.id.clone(),
            amenity_id: amenity.id.clone(),
        });
    }

    fn detach(&self, session: &mut Session, place: &mut Place, amenity: &Amenity) {
        session.stage(Change::Unlink {
            place_id: place.id.clone(),
            amenity_id: amenity.id.clone(),
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
