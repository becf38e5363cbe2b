use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::job_dto::{
    CallOutcomePayload, ClientIntentPayload, CommentPayload, CompletePayload,
    ReturnDocumentsPayload, ReviewBrandPayload, SendForReviewPayload, SendInvoicePayload,
    SubmitDocumentsPayload, UploadReceiptPayload,
};
use crate::models::role::Actor;
use crate::services::job_service::JobView;
use crate::utils::validation::validate;
use crate::workflow::JobAction;
use crate::{
    error::{Error, Result},
    AppState,
};

async fn run(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
    action: JobAction,
    expected_version: Option<i64>,
) -> Result<Json<JobView>> {
    let view = state
        .job_service
        .execute(actor, id, action, expected_version)
        .await?;
    Ok(Json(view))
}

/// Comment-only actions accept an empty body. Anything else must parse.
fn comment_body(body: Bytes) -> Result<CommentPayload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CommentPayload::default());
    }
    let payload: CommentPayload = serde_json::from_slice(&body)
        .map_err(|err| Error::BadRequest(format!("Invalid request body: {}", err)))?;
    validate(&payload)?;
    Ok(payload)
}

pub async fn record_call_outcome(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CallOutcomePayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(), expected).await
}

pub async fn record_client_intent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientIntentPayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(), expected).await
}

pub async fn send_for_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendForReviewPayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(), expected).await
}

pub async fn review_brand(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewBrandPayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(), expected).await
}

pub async fn start_document_collection(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JobView>> {
    let payload = comment_body(body)?;
    let action = JobAction::StartDocumentCollection {
        comment: payload.comment,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}

pub async fn submit_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitDocumentsPayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action()?, expected).await
}

pub async fn return_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReturnDocumentsPayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let action = JobAction::ReturnDocuments {
        reason: payload.reason,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}

pub async fn send_to_lawyer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JobView>> {
    let payload = comment_body(body)?;
    let action = JobAction::SendToLawyer {
        comment: payload.comment,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}

pub async fn accept_by_lawyer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JobView>> {
    let payload = comment_body(body)?;
    let action = JobAction::AcceptByLawyer {
        comment: payload.comment,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}

pub async fn send_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendInvoicePayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(), expected).await
}

pub async fn upload_receipt(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, invoice_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UploadReceiptPayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(invoice_id), expected).await
}

pub async fn approve_receipt(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, invoice_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Json<JobView>> {
    let payload = comment_body(body)?;
    let action = JobAction::ApproveReceipt {
        invoice_id,
        comment: payload.comment,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}

pub async fn complete_by_lawyer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompletePayload>,
) -> Result<Json<JobView>> {
    validate(&payload)?;
    let expected = payload.expected_version;
    run(&state, &actor, id, payload.into_action(), expected).await
}

pub async fn deliver_certificate(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JobView>> {
    let payload = comment_body(body)?;
    let action = JobAction::DeliverCertificate {
        comment: payload.comment,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}

pub async fn generate_power_of_attorney(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JobView>> {
    let payload = comment_body(body)?;
    let action = JobAction::GeneratePowerOfAttorney {
        comment: payload.comment,
    };
    run(&state, &actor, id, action, payload.expected_version).await
}
