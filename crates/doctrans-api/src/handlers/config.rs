//! Engine catalog and health endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use doctrans_core::catalog::{self, EngineMetadata, FOLLOW_MAIN_ENGINE, TRANSLATION_ENGINES};
use doctrans_core::language::LANGUAGES;
use doctrans_core::BackendKind;

use crate::AppState;

/// One language choice: UI label plus the wire code the engines receive.
#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub label: &'static str,
    pub code: &'static str,
}

/// Probed state of one execution backend.
#[derive(Debug, Serialize)]
pub struct BackendEntry {
    pub kind: BackendKind,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Everything a client needs to render the translation form.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub languages: Vec<LanguageEntry>,
    /// Engines with their backend kind and detail-field schemas.
    pub services: &'static [EngineMetadata],
    /// Term-extraction choices; following the main engine is always first.
    pub term_services: Vec<&'static str>,
    pub backends: Vec<BackendEntry>,
}

/// Engine catalog, language table, and live backend availability.
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let languages = LANGUAGES
        .iter()
        .map(|&(label, code)| LanguageEntry { label, code })
        .collect();

    let term_services = std::iter::once(FOLLOW_MAIN_ENGINE)
        .chain(catalog::term_extraction_engines().map(|m| m.name))
        .collect();

    let mut backends = Vec::new();
    for kind in [BackendKind::Streaming, BackendKind::Callback] {
        let health = state.orchestrator.backend_health(kind).await;
        backends.push(BackendEntry {
            kind,
            available: health.available,
            version: health.version,
        });
    }

    Json(ConfigResponse {
        languages,
        services: TRANSLATION_ENGINES,
        term_services,
        backends,
    })
}

/// Liveness plus job counts by status.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = state.orchestrator.counts().await;
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started.elapsed().as_secs(),
        "jobs": jobs,
    }))
}
