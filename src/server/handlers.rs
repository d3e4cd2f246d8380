use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::SharedState;
use crate::error::Result;
use crate::gateway::Envelope;

/// Liveness check and welcome message
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "message": "DART 공시정보 게이트웨이에 오신 것을 환영합니다",
    }))
}

/// Unified query endpoint.
///
/// The body is read as plain JSON so the secret can be checked before the
/// request shape. A body that is not JSON carries no readable secret.
pub async fn query(State(state): State<SharedState>, body: Bytes) -> Result<Json<Envelope>> {
    let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let envelope = state.gateway.query_value(value).await?;
    Ok(Json(envelope))
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub auth_key: Option<String>,
}

/// Viewer URL for a receipt number
pub async fn file_url(
    State(state): State<SharedState>,
    Path(rcp_no): Path<String>,
    Query(params): Query<FileQuery>,
) -> Result<Json<Envelope>> {
    let envelope = state.gateway.file_url(&rcp_no, params.auth_key.as_deref())?;
    Ok(Json(envelope))
}

pub async fn fallback(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": "error",
            "message": format!("No route for {}", uri.path()),
        })),
    )
}
