//! Service status and object counts

use axum::Json;
use serde_json::{json, Map, Value};

use super::ApiResult;
use crate::models::ModelKind;
use crate::storage::Session;

/// GET /status
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// GET /stats
pub async fn stats(session: Session) -> ApiResult<Json<Map<String, Value>>> {
    let mut counts = Map::new();
    for kind in ModelKind::all() {
        let count = session.count(Some(*kind)).await?;
        counts.insert(kind.plural().to_string(), json!(count));
    }
    Ok(Json(counts))
}
