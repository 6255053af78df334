//! Models - Persisted Domain Types
//!
//! TigerStyle: Explicit types per kind, one tagged enum for storage.
//!
//! Every model carries the base fields (`id`, `created_at`, `updated_at`)
//! and serializes to a dictionary tagged with `__class__`. The file backend
//! stores [`Entity`] values directly, so the on-disk shape and the API
//! shape are the same.

mod amenity;
mod place;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use amenity::Amenity;
pub use place::Place;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Timestamp layout used in serialized dictionaries
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Maximum length of a name field in bytes
pub const NAME_BYTES_MAX: usize = 128;

/// Maximum length of a description field in bytes
pub const DESCRIPTION_BYTES_MAX: usize = 1024;

// =============================================================================
// Model Kind
// =============================================================================

/// Kinds of entities known to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Amenity offered by places
    Amenity,
    /// Rentable place
    Place,
}

impl ModelKind {
    /// Class name, as used in `__class__` and storage keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amenity => "Amenity",
            Self::Place => "Place",
        }
    }

    /// Plural name used by the stats endpoint.
    #[must_use]
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Amenity => "amenities",
            Self::Place => "places",
        }
    }

    /// Parse from a class name.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Amenity" => Some(Self::Amenity),
            "Place" => Some(Self::Place),
            _ => None,
        }
    }

    /// Get all kinds in order.
    #[must_use]
    pub fn all() -> &'static [ModelKind] {
        &[Self::Amenity, Self::Place]
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Model Trait
// =============================================================================

/// Common behavior of persisted models.
pub trait Model: Serialize + Clone + Send + Sync + 'static {
    /// Kind tag for this model.
    const KIND: ModelKind;

    /// Unique identifier.
    fn id(&self) -> &str;

    /// Apply user-supplied attributes, skipping fields that callers
    /// are never allowed to overwrite.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidField`] when a value has the wrong type
    /// and [`ModelError::TooLong`] when a string exceeds its limit.
    fn apply(&mut self, attrs: &Map<String, Value>) -> Result<(), ModelError>;

    /// Refresh `updated_at`.
    fn touch(&mut self);

    /// Dictionary view, tagged with `__class__`.
    fn to_dict(&self) -> Dict<'_, Self> {
        Dict {
            class: Self::KIND.as_str(),
            model: self,
        }
    }
}

/// Serializable dictionary view of a model.
#[derive(Debug, Serialize)]
pub struct Dict<'a, M: Model> {
    #[serde(rename = "__class__")]
    class: &'static str,
    #[serde(flatten)]
    model: &'a M,
}

// =============================================================================
// Entity
// =============================================================================

/// Any persisted model, tagged by class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    /// An amenity
    Amenity(Amenity),
    /// A place
    Place(Place),
}

impl Entity {
    /// Kind of the wrapped model.
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Amenity(_) => ModelKind::Amenity,
            Self::Place(_) => ModelKind::Place,
        }
    }

    /// Identifier of the wrapped model.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Amenity(a) => &a.id,
            Self::Place(p) => &p.id,
        }
    }

    /// Storage key, `<Kind>.<id>`.
    #[must_use]
    pub fn key(&self) -> String {
        storage_key(self.kind(), self.id())
    }

    /// Unwrap as a place.
    #[must_use]
    pub fn into_place(self) -> Option<Place> {
        match self {
            Self::Place(p) => Some(p),
            Self::Amenity(_) => None,
        }
    }

    /// Unwrap as an amenity.
    #[must_use]
    pub fn into_amenity(self) -> Option<Amenity> {
        match self {
            Self::Amenity(a) => Some(a),
            Self::Place(_) => None,
        }
    }
}

impl From<Amenity> for Entity {
    fn from(amenity: Amenity) -> Self {
        Self::Amenity(amenity)
    }
}

impl From<Place> for Entity {
    fn from(place: Place) -> Self {
        Self::Place(place)
    }
}

/// Build the `<Kind>.<id>` key used by the file backend.
#[must_use]
pub fn storage_key(kind: ModelKind, id: &str) -> String {
    format!("{}.{}", kind.as_str(), id)
}

// =============================================================================
// Errors
// =============================================================================

/// Attribute validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ModelError {
    #[error("invalid value for {field}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid value for {field}: expected string of at most {max} bytes")]
    TooLong { field: &'static str, max: usize },
}

// =============================================================================
// Helpers
// =============================================================================

/// Current time at the precision kept by serialized timestamps.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Generate a fresh identifier.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn string_field(
    value: &Value,
    field: &'static str,
    max: usize,
) -> Result<String, ModelError> {
    match value.as_str() {
        Some(s) if s.len() <= max => Ok(s.to_string()),
        Some(_) => Err(ModelError::TooLong { field, max }),
        None => Err(ModelError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

pub(crate) fn int_field(value: &Value, field: &'static str) -> Result<i64, ModelError> {
    value.as_i64().ok_or(ModelError::InvalidField {
        field,
        expected: "integer",
    })
}

pub(crate) fn opt_float_field(
    value: &Value,
    field: &'static str,
) -> Result<Option<f64>, ModelError> {
    if value.is_null() {
        return Ok(None);
    }
    value.as_f64().map(Some).ok_or(ModelError::InvalidField {
        field,
        expected: "number",
    })
}

/// Serde adapter for the dictionary timestamp layout.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
