//! Storage - Backend Trait and Implementations
//!
//! TigerStyle: One facade, two interchangeable backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Session (one per request, drop = close)         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageBackend Trait                      │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                              ↑
//!          │                              │
//! ┌────────┴────────┐           ┌────────┴────────┐
//! │   FileStorage   │           │    DbStorage    │
//! │  (JSON file)    │           │    (SQLite)     │
//! └─────────────────┘           └─────────────────┘
//! ```
//!
//! The backend is picked once at startup from `HBNB_TYPE_STORAGE`.

mod backend;
mod db;
mod error;
mod file;
mod session;

use std::sync::Arc;

pub use backend::{Change, StorageBackend};
pub use db::DbStorage;
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use session::Session;

use crate::config::{Config, StorageType};
use crate::links::{AmenityLinks, IdListLinks, JoinTableLinks};

/// Storage backend plus the link strategy that matches it.
#[derive(Clone)]
pub struct Storage {
    /// Shared backend
    pub backend: Arc<dyn StorageBackend>,
    /// Place/amenity link strategy for this backend
    pub links: Arc<dyn AmenityLinks>,
}

impl Storage {
    /// Open the backend selected by configuration.
    ///
    /// # Errors
    /// Returns error if the backend cannot be opened.
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        match config.storage_type() {
            StorageType::Db => {
                let path = config.db_path();
                tracing::info!(path = %path.display(), "using db storage");
                Ok(Self::db(DbStorage::open(&path).await?))
            }
            StorageType::File => {
                let path = config.file_path();
                tracing::info!(path = %path.display(), "using file storage");
                Ok(Self::file(FileStorage::open(path).await?))
            }
        }
    }

    /// Wrap a file backend with id-list links.
    #[must_use]
    pub fn file(storage: FileStorage) -> Self {
        Self {
            backend: Arc::new(storage),
            links: Arc::new(IdListLinks),
        }
    }

    /// Wrap a relational backend with join-table links.
    #[must_use]
    pub fn db(storage: DbStorage) -> Self {
        let storage = Arc::new(storage);
        Self {
            backend: storage.clone(),
            links: Arc::new(JoinTableLinks::new(storage)),
        }
    }

    /// Open a per-request session.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::open(self.backend.clone())
    }
}
