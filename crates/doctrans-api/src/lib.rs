//! doctrans-api - HTTP API server for doctrans
//!
//! Router construction and handler state live here so integration tests can
//! drive the exact production middleware stack without a TCP listener; the
//! binary in `main.rs` only adds bootstrap (env, logging, engine wiring).

pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use doctrans_core::defaults::{CORS_MAX_AGE_SECS, MAX_UPLOAD_SIZE_BYTES};
use doctrans_jobs::Orchestrator;

use handlers::{
    cancel_job, create_translation, download_artifact, get_config, health_check, job_status,
    upload_file,
};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single owner of job lifecycles.
    pub orchestrator: Arc<Orchestrator>,
    /// Process start, for the health endpoint's uptime.
    pub started: Instant,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        AppState {
            orchestrator,
            started: Instant::now(),
        }
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Core(doctrans_core::Error),
    BadRequest(String),
}

impl From<doctrans_core::Error> for ApiError {
    fn from(err: doctrans_core::Error) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use doctrans_core::Error;

        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Core(err) => {
                let status = match &err {
                    Error::NotFound(_) | Error::JobNotFound(_) => StatusCode::NOT_FOUND,
                    Error::InvalidState(_) | Error::InvalidSettings(_) => StatusCode::BAD_REQUEST,
                    Error::BackendFailure(_)
                    | Error::Serialization(_)
                    | Error::Config(_)
                    | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// CORS
// =============================================================================

/// Parse allowed CORS origins from the environment.
///
/// # Environment Variable
/// `ALLOWED_ORIGINS` - Comma-separated list of allowed origins
///
/// # Default Origins
/// If not set or empty:
/// - http://localhost:8000
/// - http://localhost:3000
pub fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:8000,http://localhost:3000".to_string());

    if origins_str.trim().is_empty() {
        return vec![
            HeaderValue::from_static("http://localhost:8000"),
            HeaderValue::from_static("http://localhost:3000"),
        ];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with the full middleware stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Uploads and artifact downloads
        .route("/api/upload", post(upload_file))
        .route("/api/download/:job_id/:kind", get(download_artifact))
        // Jobs
        .route("/api/translate", post(create_translation))
        .route("/api/status/:job_id", get(job_status))
        .route("/api/cancel/:job_id", post(cancel_job))
        // Engine catalog and availability
        .route("/api/config", get(get_config))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(CORS_MAX_AGE_SECS))
        })
        // Scanned source PDFs run large; raise axum's default extractor cap
        // to the documented upload limit.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_SIZE_BYTES))
        .with_state(state)
}
