pub mod actions;
pub mod export;
pub mod files;
pub mod health;
pub mod jobs;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    auth::require_auth,
    cors::dashboard_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/files", post(files::upload_file))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/api/jobs/counts", get(jobs::section_counts))
        .route("/api/jobs/export", get(export::export_jobs))
        .route("/api/jobs/:id", get(jobs::get_job))
        .route("/api/jobs/:id/call-outcome", post(actions::record_call_outcome))
        .route("/api/jobs/:id/client-intent", post(actions::record_client_intent))
        .route("/api/jobs/:id/send-for-review", post(actions::send_for_review))
        .route("/api/jobs/:id/review-brand", post(actions::review_brand))
        .route("/api/jobs/:id/start-documents", post(actions::start_document_collection))
        .route("/api/jobs/:id/submit-documents", post(actions::submit_documents))
        .route("/api/jobs/:id/return-documents", post(actions::return_documents))
        .route("/api/jobs/:id/send-to-lawyer", post(actions::send_to_lawyer))
        .route("/api/jobs/:id/accept", post(actions::accept_by_lawyer))
        .route("/api/jobs/:id/invoices", post(actions::send_invoice))
        .route(
            "/api/jobs/:id/invoices/:invoice_id/receipt",
            post(actions::upload_receipt),
        )
        .route(
            "/api/jobs/:id/invoices/:invoice_id/approve",
            post(actions::approve_receipt),
        )
        .route("/api/jobs/:id/complete", post(actions::complete_by_lawyer))
        .route("/api/jobs/:id/deliver", post(actions::deliver_certificate))
        .route(
            "/api/jobs/:id/power-of-attorney",
            post(actions::generate_power_of_attorney),
        )
        .nest_service("/uploads", ServeDir::new(state.files.root()))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .layer(from_fn_with_state(
            RateLimiter::new(state.api_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(dashboard_cors())
        .layer(TraceLayer::new_for_http())
}
