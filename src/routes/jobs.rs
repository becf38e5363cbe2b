use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::job_dto::{CreateJobPayload, WorklistQuery};
use crate::models::job::NewJob;
use crate::models::role::Actor;
use crate::utils::validation::validate;
use crate::{error::Result, AppState};

pub async fn create_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let view = state
        .job_service
        .create_job(&actor, NewJob::from(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.job_service.get_job(&actor, id).await?;
    Ok(Json(view))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<WorklistQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .worklist_service
        .list(&actor, query.role()?, query.section()?, &query.filter()?)
        .await?;
    Ok(Json(page))
}

pub async fn section_counts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<WorklistQuery>,
) -> Result<impl IntoResponse> {
    let counts = state
        .worklist_service
        .section_counts(&actor, query.role()?)
        .await?;
    Ok(Json(counts))
}
