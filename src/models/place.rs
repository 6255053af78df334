//! Place - a rentable listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    int_field, new_id, now, opt_float_field, string_field, timestamp, Model, ModelError,
    ModelKind, DESCRIPTION_BYTES_MAX, NAME_BYTES_MAX,
};

/// A place offered by a user in a city.
///
/// `city_id` and `user_id` reference peers that live outside this service.
/// `amenity_ids` is only populated by the file backend; the relational
/// backend keeps links in its join table instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Creation timestamp
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Owning city
    pub city_id: String,
    /// Owning user
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Linked amenity ids (file backend only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenity_ids: Vec<String>,
}

impl Place {
    /// Create a new place with a fresh id and zeroed counters.
    ///
    /// # Panics
    /// Panics if name exceeds [`NAME_BYTES_MAX`].
    #[must_use]
    pub fn new(city_id: String, user_id: String, name: String) -> Self {
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
            city_id,
            user_id,
            name,
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
        }
    }
}

impl Model for Place {
    const KIND: ModelKind = ModelKind::Place;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, attrs: &Map<String, Value>) -> Result<(), ModelError> {
        // Validate everything first so a bad field leaves the place untouched
        let mut next = self.clone();
        for (key, value) in attrs {
            match key.as_str() {
                "name" => next.name = string_field(value, "name", NAME_BYTES_MAX)?,
                "description" => {
                    next.description = if value.is_null() {
                        None
                    } else {
                        Some(string_field(value, "description", DESCRIPTION_BYTES_MAX)?)
                    };
                }
                "number_rooms" => next.number_rooms = int_field(value, "number_rooms")?,
                "number_bathrooms" => {
                    next.number_bathrooms = int_field(value, "number_bathrooms")?;
                }
                "max_guest" => next.max_guest = int_field(value, "max_guest")?,
                "price_by_night" => next.price_by_night = int_field(value, "price_by_night")?,
                "latitude" => next.latitude = opt_float_field(value, "latitude")?,
                "longitude" => next.longitude = opt_float_field(value, "longitude")?,
                // id, timestamps, owners and links are never user-writable
                _ => {}
            }
        }
        *self = next;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = now();
    }
}
