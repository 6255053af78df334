//! Storage errors

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by storage backends.
///
/// An absent entity is not an error; lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("unsupported by {backend} storage: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
