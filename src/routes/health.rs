use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::utils::time::now;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "time": now(),
    });
    (StatusCode::OK, Json(body))
}
