use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    models::notice::{CreateNoticeRequest, Notice},
    AppState,
};

/// GET /notices: public endpoint, returns every active notice.
/// Expired notices are purged from the store as a side effect.
pub async fn list_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.active_notices(Utc::now()))
}

/// POST /notices: admin endpoint, adds a notice.
pub async fn add_notice(
    State(state): State<AppState>,
    payload: Result<Json<CreateNoticeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let Json(body) = payload.map_err(|e| {
        warn!("Rejected notice body: {}", e.body_text());
        (e.status(), Json(json!({ "error": e.body_text() })))
    })?;

    let notice = state.notices.add(body, Utc::now()).map_err(|e| {
        warn!("Rejected notice: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    info!(
        "Notice added: '{}' (expires {})",
        notice.title, notice.expires_at
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Notice added successfully",
        })),
    ))
}
