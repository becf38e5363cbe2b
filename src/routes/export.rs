use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};

use crate::dto::job_dto::WorklistQuery;
use crate::models::role::Actor;
use crate::services::export_service::{ExportService, XLSX_CONTENT_TYPE};
use crate::{error::Result, AppState};

/// Export the requested worklist as XLSX
pub async fn export_jobs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<WorklistQuery>,
) -> Result<impl IntoResponse> {
    let role = query.role()?;
    let section = query.section()?;
    let page = state
        .worklist_service
        .list(&actor, role, section, &query.filter()?)
        .await?;

    let role_name = role.unwrap_or(actor.role).as_str();
    let title = match section {
        Some(section) => format!("Ishlar: {} / {}", role_name, section.as_str()),
        None => format!("Ishlar: {}", role_name),
    };
    let buffer = ExportService::generate_jobs_xlsx(&page.items, &title)?;

    let filename = format!(
        "jobs_{}_{}_{}.xlsx",
        role_name,
        section.map(|s| s.as_str()).unwrap_or("all"),
        chrono::Utc::now().format("%Y%m%d")
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);
    tracing::info!(actor_role = %actor.role, rows = page.total, "Worklist exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
