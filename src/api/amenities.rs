//! Amenity CRUD endpoints

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::{find_amenity, json_object, ApiError, ApiResult};
use crate::models::{Amenity, Entity, Model, ModelKind};
use crate::storage::Session;

/// GET /amenities
pub async fn list(session: Session) -> ApiResult<Response> {
    let amenities: Vec<Amenity> = session
        .all(Some(ModelKind::Amenity))
        .await?
        .into_iter()
        .filter_map(Entity::into_amenity)
        .collect();

    let dicts: Vec<_> = amenities.iter().map(Model::to_dict).collect();
    Ok(Json(dicts).into_response())
}

/// GET /amenities/:amenity_id
pub async fn show(session: Session, Path(amenity_id): Path<String>) -> ApiResult<Response> {
    let amenity = find_amenity(&session, &amenity_id).await?;
    Ok(Json(amenity.to_dict()).into_response())
}

/// DELETE /amenities/:amenity_id
pub async fn remove(mut session: Session, Path(amenity_id): Path<String>) -> ApiResult<Response> {
    let amenity = find_amenity(&session, &amenity_id).await?;

    session.delete(ModelKind::Amenity, &amenity.id);
    session.save().await?;

    tracing::info!(%amenity_id, "amenity deleted");
    Ok((StatusCode::OK, Json(json!({}))).into_response())
}

/// POST /amenities
pub async fn create(mut session: Session, body: Bytes) -> ApiResult<Response> {
    let attrs = json_object(&body)?;
    if !attrs.contains_key("name") {
        return Err(ApiError::BadRequest("Missing name".to_string()));
    }

    let mut amenity = Amenity::new(String::new());
    amenity.apply(&attrs)?;

    session.add(amenity.clone());
    session.save().await?;

    tracing::info!(amenity_id = %amenity.id, "amenity created");
    Ok((StatusCode::CREATED, Json(amenity.to_dict())).into_response())
}

/// PUT /amenities/:amenity_id
pub async fn update(
    mut session: Session,
    Path(amenity_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let mut amenity = find_amenity(&session, &amenity_id).await?;
    let attrs = json_object(&body)?;

    amenity.apply(&attrs)?;
    amenity.touch();
    session.add(amenity.clone());
    session.save().await?;

    Ok((StatusCode::OK, Json(amenity.to_dict())).into_response())
}
