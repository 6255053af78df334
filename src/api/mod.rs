//! HTTP API
//!
//! Router, shared extractors and request helpers. Every route lives
//! under [`API_PREFIX`](crate::API_PREFIX); unknown paths get the same
//! JSON 404 body as missing entities.

pub mod amenities;
mod error;
pub mod index;
pub mod place_amenities;
pub mod places;

use std::convert::Infallible;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Map, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

use crate::models::{Amenity, Place};
use crate::storage::{Session, Storage};
use crate::API_PREFIX;

/// Build the application router.
pub fn router(storage: Storage) -> Router {
    let api = Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route(
            "/amenities/:amenity_id",
            get(amenities::show)
                .put(amenities::update)
                .delete(amenities::remove),
        )
        .route("/places", post(places::create))
        .route(
            "/places/:place_id",
            get(places::show).put(places::update).delete(places::remove),
        )
        .route("/places/:place_id/amenities", get(place_amenities::list))
        .route(
            "/places/:place_id/amenities/:amenity_id",
            post(place_amenities::attach).delete(place_amenities::detach),
        );

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(storage)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Each handler that asks for a `Session` gets a fresh one, closed when
/// the handler returns on any path.
#[async_trait]
impl FromRequestParts<Storage> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        storage: &Storage,
    ) -> Result<Self, Self::Rejection> {
        Ok(storage.session())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub(crate) async fn find_place(session: &Session, id: &str) -> ApiResult<Place> {
    session.get_place(id).await?.ok_or(ApiError::NotFound)
}

pub(crate) async fn find_amenity(session: &Session, id: &str) -> ApiResult<Amenity> {
    session.get_amenity(id).await?.ok_or(ApiError::NotFound)
}

/// Parse a request body that must be a JSON object.
pub(crate) fn json_object(body: &Bytes) -> ApiResult<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::BadRequest("Not a JSON".to_string())),
    }
}

/// Fetch a required string attribute.
pub(crate) fn required_string(attrs: &Map<String, Value>, field: &str) -> ApiResult<String> {
    match attrs.get(field) {
        None => Err(ApiError::BadRequest(format!("Missing {field}"))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::BadRequest(format!(
            "invalid value for {field}: expected string"
        ))),
    }
}
