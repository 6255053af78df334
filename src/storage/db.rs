//! DbStorage - Relational Storage
//!
//! TigerStyle: Explicit schema, one transaction per commit.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE amenities (id TEXT PRIMARY KEY, created_at, updated_at, name);
//! CREATE TABLE places (id TEXT PRIMARY KEY, created_at, updated_at, city_id,
//!                      user_id, name, description, number_rooms, ...);
//! CREATE TABLE place_amenity (
//!     place_id   TEXT REFERENCES places(id) ON DELETE CASCADE,
//!     amenity_id TEXT REFERENCES amenities(id) ON DELETE CASCADE,
//!     PRIMARY KEY (place_id, amenity_id)
//! );
//! ```
//!
//! Links are rows in `place_amenity`; `Place::amenity_ids` is never
//! read or written here.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

use super::backend::{Change, StorageBackend};
use super::error::{StorageError, StorageResult};
use crate::models::{Amenity, Entity, ModelKind, Place};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Maximum pooled connections
pub const POOL_CONNECTIONS_MAX: u32 = 8;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS amenities (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS places (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        city_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        number_rooms INTEGER NOT NULL DEFAULT 0,
        number_bathrooms INTEGER NOT NULL DEFAULT 0,
        max_guest INTEGER NOT NULL DEFAULT 0,
        price_by_night INTEGER NOT NULL DEFAULT 0,
        latitude REAL,
        longitude REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS place_amenity (
        place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
        amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
        PRIMARY KEY (place_id, amenity_id)
    )
    "#,
];

// =============================================================================
// DbStorage
// =============================================================================

/// SQLite storage backend.
pub struct DbStorage {
    pool: SqlitePool,
}

impl DbStorage {
    /// Open (creating if missing) the database at `path`.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or the schema
    /// cannot be created.
    pub async fn open(path: &Path) -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_CONNECTIONS_MAX)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::connection(format!("failed to open {}: {e}", path.display()))
            })?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> StorageResult<()> {
        for &statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::internal(format!("failed to create schema: {e}")))?;
        }
        Ok(())
    }

    /// Amenities linked to a place, in link order.
    pub async fn amenities_of(&self, place_id: &str) -> StorageResult<Vec<Amenity>> {
        // Precondition
        assert!(!place_id.is_empty(), "place_id cannot be empty");

        let rows = sqlx::query(
            r#"
            SELECT a.* FROM amenities a
            JOIN place_amenity pa ON pa.amenity_id = a.id
            WHERE pa.place_id = ?
            ORDER BY pa.rowid
            "#,
        )
        .bind(place_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::read(format!("failed to list linked amenities: {e}")))?;

        rows.iter().map(row_to_amenity).collect()
    }

    /// Whether a place/amenity row exists in the join table.
    pub async fn is_linked(&self, place_id: &str, amenity_id: &str) -> StorageResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM place_amenity WHERE place_id = ? AND amenity_id = ?",
        )
        .bind(place_id)
        .bind(amenity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::read(format!("failed to check link: {e}")))?;

        Ok(count > 0)
    }

    async fn apply(tx: &mut Transaction<'_, Sqlite>, change: Change) -> StorageResult<()> {
        let result = match change {
            Change::Upsert(Entity::Amenity(a)) => {
                sqlx::query(
                    r#"
                    INSERT INTO amenities (id, created_at, updated_at, name)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        name = excluded.name
                    "#,
                )
                .bind(&a.id)
                .bind(a.created_at)
                .bind(a.updated_at)
                .bind(&a.name)
                .execute(&mut **tx)
                .await
            }
            Change::Upsert(Entity::Place(p)) => {
                sqlx::query(
                    r#"
                    INSERT INTO places (id, created_at, updated_at, city_id, user_id, name,
                        description, number_rooms, number_bathrooms, max_guest,
                        price_by_night, latitude, longitude)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        city_id = excluded.city_id,
                        user_id = excluded.user_id,
                        name = excluded.name,
                        description = excluded.description,
                        number_rooms = excluded.number_rooms,
                        number_bathrooms = excluded.number_bathrooms,
                        max_guest = excluded.max_guest,
                        price_by_night = excluded.price_by_night,
                        latitude = excluded.latitude,
                        longitude = excluded.longitude
                    "#,
                )
                .bind(&p.id)
                .bind(p.created_at)
                .bind(p.updated_at)
                .bind(&p.city_id)
                .bind(&p.user_id)
                .bind(&p.name)
                .bind(&p.description)
                .bind(p.number_rooms)
                .bind(p.number_bathrooms)
                .bind(p.max_guest)
                .bind(p.price_by_night)
                .bind(p.latitude)
                .bind(p.longitude)
                .execute(&mut **tx)
                .await
            }
            Change::Delete { kind, id } => {
                let sql = format!("DELETE FROM {} WHERE id = ?", table(kind));
                sqlx::query(&sql).bind(&id).execute(&mut **tx).await
            }
            Change::Link {
                place_id,
                amenity_id,
            } => {
                sqlx::query("INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?, ?)")
                    .bind(&place_id)
                    .bind(&amenity_id)
                    .execute(&mut **tx)
                    .await
            }
            Change::Unlink {
                place_id,
                amenity_id,
            } => {
                sqlx::query("DELETE FROM place_amenity WHERE place_id = ? AND amenity_id = ?")
                    .bind(&place_id)
                    .bind(&amenity_id)
                    .execute(&mut **tx)
                    .await
            }
        };

        result
            .map(|_| ())
            .map_err(|e| StorageError::write(format!("failed to apply change: {e}")))
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

fn table(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Amenity => "amenities",
        ModelKind::Place => "places",
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StorageError::internal(format!("column {name}: {e}")))
}

fn row_to_amenity(row: &SqliteRow) -> StorageResult<Amenity> {
    Ok(Amenity {
        id: column(row, "id")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
        name: column(row, "name")?,
    })
}

fn row_to_place(row: &SqliteRow) -> StorageResult<Place> {
    Ok(Place {
        id: column(row, "id")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
        city_id: column(row, "city_id")?,
        user_id: column(row, "user_id")?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        number_rooms: column(row, "number_rooms")?,
        number_bathrooms: column(row, "number_bathrooms")?,
        max_guest: column(row, "max_guest")?,
        price_by_night: column(row, "price_by_night")?,
        latitude: column(row, "latitude")?,
        longitude: column(row, "longitude")?,
        amenity_ids: Vec::new(),
    })
}

fn row_to_entity(kind: ModelKind, row: &SqliteRow) -> StorageResult<Entity> {
    match kind {
        ModelKind::Amenity => row_to_amenity(row).map(Entity::Amenity),
        ModelKind::Place => row_to_place(row).map(Entity::Place),
    }
}

// =============================================================================
// StorageBackend Implementation
// =============================================================================

#[async_trait]
impl StorageBackend for DbStorage {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn get(&self, kind: ModelKind, id: &str) -> StorageResult<Option<Entity>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", table(kind));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::read(format!("failed to get {kind}: {e}")))?;

        row.map(|row| row_to_entity(kind, &row)).transpose()
    }

    async fn all(&self, kind: Option<ModelKind>) -> StorageResult<Vec<Entity>> {
        let kinds = match kind {
            Some(k) => vec![k],
            None => ModelKind::all().to_vec(),
        };

        let mut entities = Vec::new();
        for kind in kinds {
            let sql = format!("SELECT * FROM {} ORDER BY created_at, id", table(kind));
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::read(format!("failed to list {kind}: {e}")))?;
            for row in &rows {
                entities.push(row_to_entity(kind, row)?);
            }
        }
        Ok(entities)
    }

    async fn count(&self, kind: Option<ModelKind>) -> StorageResult<usize> {
        let kinds = match kind {
            Some(k) => vec![k],
            None => ModelKind::all().to_vec(),
        };

        let mut total = 0usize;
        for kind in kinds {
            let sql = format!("SELECT COUNT(*) FROM {}", table(kind));
            let count: i64 = sqlx::query_scalar(&sql)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::read(format!("failed to count {kind}: {e}")))?;

            // Postcondition
            assert!(count >= 0, "count cannot be negative");
            total += count as usize;
        }
        Ok(total)
    }

    async fn commit(&self, changes: Vec<Change>) -> StorageResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::connection(format!("failed to begin: {e}")))?;

        for change in changes {
            // Dropping `tx` on error rolls back
            Self::apply(&mut tx, change).await?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::write(format!("failed to commit: {e}")))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Tests
// =============================================================================
