//! HBnB API - places, amenities and the links between them
//!
//! A REST service over two interchangeable storage backends:
//! - File: a JSON snapshot, links kept as id lists on places
//! - Db: SQLite, links kept in a join table
//!
//! The backend is chosen once at startup (`HBNB_TYPE_STORAGE`); handlers
//! only see the [`storage::StorageBackend`] and [`links::AmenityLinks`]
//! traits, and each request gets its own [`storage::Session`].

pub mod api;
pub mod config;
pub mod links;
pub mod models;
pub mod storage;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "hbnb";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix every route is mounted under
pub const API_PREFIX: &str = "/api/v1";
