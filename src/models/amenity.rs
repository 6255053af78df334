//! Amenity - something a place can offer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{new_id, now, string_field, timestamp, Model, ModelError, ModelKind, NAME_BYTES_MAX};

/// An amenity, linked to places many-to-many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Creation timestamp
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Display name
    pub name: String,
}

impl Amenity {
    /// Create a new amenity with a fresh id.
    ///
    /// # Panics
    /// Panics if name exceeds [`NAME_BYTES_MAX`].
    #[must_use]
    pub fn new(name: String) -> Self {
        assert!(
            name.len() <= NAME_BYTES_MAX,
            "name {} bytes exceeds max {}",
            name.len(),
            NAME_BYTES_MAX
        );

        let now = now();
        Self {
            id: new_id(),
            created_at: now,
            updated_at: now,
            name,
        }
    }
}

impl Model for Amenity {
    const KIND: ModelKind = ModelKind::Amenity;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, attrs: &Map<String, Value>) -> Result<(), ModelError> {
        if let Some(value) = attrs.get("name") {
            self.name = string_field(value, "name", NAME_BYTES_MAX)?;
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = now();
    }
}
