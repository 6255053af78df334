//! Configuration
//!
//! Every setting is a CLI flag with an environment fallback, so the
//! usual `HBNB_*` variables work unchanged. `main` loads `.env` before
//! parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::APP_NAME;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Default bind host
pub const API_HOST_DEFAULT: &str = "0.0.0.0";

/// Default bind port
pub const API_PORT_DEFAULT: u16 = 5000;

/// Default JSON file for the file backend
pub const FILE_PATH_DEFAULT: &str = "file.json";

/// Default SQLite database for the db backend
pub const DB_PATH_DEFAULT: &str = "hbnb.sqlite3";

/// Storage flag value that selects the relational backend
pub const STORAGE_FLAG_DB: &str = "db";

// =============================================================================
// Storage Type
// =============================================================================

/// Which backend serves this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Relational backend with a join table for links
    Db,
    /// JSON file backend with id lists on places
    File,
}

impl StorageType {
    /// `"db"` selects the relational backend; anything else means file.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        if flag == STORAGE_FLAG_DB {
            Self::Db
        } else {
            Self::File
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// HBnB REST API
#[derive(Parser, Debug, Clone)]
#[command(name = APP_NAME)]
#[command(about = "REST API for places, amenities and their links")]
#[command(version)]
pub struct Config {
    /// Storage backend: "db" for SQLite, anything else for the JSON file
    #[arg(long = "storage", env = "HBNB_TYPE_STORAGE", default_value = "file")]
    pub storage: String,

    /// Bind host
    #[arg(long, env = "HBNB_API_HOST", default_value = API_HOST_DEFAULT)]
    pub host: String,

    /// Bind port
    #[arg(long, env = "HBNB_API_PORT", default_value_t = API_PORT_DEFAULT)]
    pub port: u16,

    /// JSON file used by the file backend
    #[arg(long, env = "HBNB_FILE_PATH", default_value = FILE_PATH_DEFAULT)]
    pub file_path: String,

    /// SQLite database used by the db backend
    #[arg(long, env = "HBNB_DB_PATH", default_value = DB_PATH_DEFAULT)]
    pub db_path: String,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Backend selected by the storage flag.
    #[must_use]
    pub fn storage_type(&self) -> StorageType {
        StorageType::from_flag(&self.storage)
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// File backend path with `~` expanded.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.file_path).as_ref())
    }

    /// Database path with `~` expanded.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path).as_ref())
    }

    /// Log filter used when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info,tower_http=debug",
            1 => "debug",
            _ => "trace",
        }
    }
}
