use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Dashboards are served from other origins; they need the auth header in
/// and the download filename out.
pub fn dashboard_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
}
