//! Place↔Amenity link endpoints
//!
//! ```text
//! GET    /places/:place_id/amenities              list linked amenities
//! POST   /places/:place_id/amenities/:amenity_id  link (201 new, 200 existing)
//! DELETE /places/:place_id/amenities/:amenity_id  unlink (404 when not linked)
//! ```
//!
//! The place is always resolved first, so an unknown place is a 404
//! before any amenity lookup happens. Only the creating and removing paths
//! write to storage.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::{find_amenity, find_place, ApiError, ApiResult};
use crate::models::Model;
use crate::storage::{Session, Storage};

/// GET /places/:place_id/amenities
pub async fn list(
    State(storage): State<Storage>,
    session: Session,
    Path(place_id): Path<String>,
) -> ApiResult<Response> {
    let place = find_place(&session, &place_id).await?;
    let amenities = storage.links.list(&session, &place).await?;

    let dicts: Vec<_> = amenities.iter().map(Model::to_dict).collect();
    Ok(Json(dicts).into_response())
}

/// POST /places/:place_id/amenities/:amenity_id
pub async fn attach(
    State(storage): State<Storage>,
    mut session: Session,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let mut place = find_place(&session, &place_id).await?;
    let amenity = find_amenity(&session, &amenity_id).await?;

    if storage.links.exists(&session, &place, &amenity).await? {
        return Ok((StatusCode::OK, Json(amenity.to_dict())).into_response());
    }

    storage.links.attach(&mut session, &mut place, &amenity);
    session.save().await?;

    tracing::info!(%place_id, %amenity_id, links = storage.links.name(), "amenity linked");
    Ok((StatusCode::CREATED, Json(amenity.to_dict())).into_response())
}

/// DELETE /places/:place_id/amenities/:amenity_id
pub async fn detach(
    State(storage): State<Storage>,
    mut session: Session,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let mut place = find_place(&session, &place_id).await?;
    let amenity = find_amenity(&session, &amenity_id).await?;

    if !storage.links.exists(&session, &place, &amenity).await? {
        return Err(ApiError::NotFound);
    }

    storage.links.detach(&mut session, &mut place, &amenity);
    session.save().await?;

    tracing::info!(%place_id, %amenity_id, links = storage.links.name(), "amenity unlinked");
    Ok((StatusCode::OK, Json(json!({}))).into_response())
}
