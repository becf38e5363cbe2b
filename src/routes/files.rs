use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::error::{Error, Result};
use crate::models::role::Actor;
use crate::AppState;

/// Accepts one `file` part and returns the reference actions should carry.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await?;
        let stored = state.files.save(&filename, &data).await?;
        tracing::info!(
            actor_role = %actor.role,
            file = %stored.path.as_str(),
            size = stored.size,
            "File stored"
        );
        return Ok((StatusCode::CREATED, Json(stored)));
    }
    Err(Error::validation("file", "multipart field 'file' is required"))
}
