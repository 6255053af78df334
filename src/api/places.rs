//! Place endpoints
//!
//! Creation needs `city_id`, `user_id` and `name`. Owners and links cannot
//! be changed through `PUT`; links go through the place/amenity endpoints.

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::{find_place, json_object, required_string, ApiError, ApiResult};
use crate::models::{Model, ModelKind, Place};
use crate::storage::Session;

/// GET /places/:place_id
pub async fn show(session: Session, Path(place_id): Path<String>) -> ApiResult<Response> {
    let place = find_place(&session, &place_id).await?;
    Ok(Json(place.to_dict()).into_response())
}

/// DELETE /places/:place_id
pub async fn remove(mut session: Session, Path(place_id): Path<String>) -> ApiResult<Response> {
    let place = find_place(&session, &place_id).await?;

    session.delete(ModelKind::Place, &place.id);
    session.save().await?;

    tracing::info!(%place_id, "place deleted");
    Ok((StatusCode::OK, Json(json!({}))).into_response())
}

/// POST /places
pub async fn create(mut session: Session, body: Bytes) -> ApiResult<Response> {
    let attrs = json_object(&body)?;
    let city_id = required_string(&attrs, "city_id")?;
    let user_id = required_string(&attrs, "user_id")?;
    if !attrs.contains_key("name") {
        return Err(ApiError::BadRequest("Missing name".to_string()));
    }

    let mut place = Place::new(city_id, user_id, String::new());
    place.apply(&attrs)?;

    session.add(place.clone());
    session.save().await?;

    tracing::info!(place_id = %place.id, "place created");
    Ok((StatusCode::CREATED, Json(place.to_dict())).into_response())
}

/// PUT /places/:place_id
pub async fn update(
    mut session: Session,
    Path(place_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let mut place = find_place(&session, &place_id).await?;
    let attrs = json_object(&body)?;

    place.apply(&attrs)?;
    place.touch();
    session.add(place.clone());
    session.save().await?;

    Ok((StatusCode::OK, Json(place.to_dict())).into_response())
}
