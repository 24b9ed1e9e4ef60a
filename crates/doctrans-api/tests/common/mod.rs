//! Shared helpers for router-level integration tests.
//!
//! Builds the production router over scripted engines and temp directories,
//! and drives it with `tower::ServiceExt::oneshot` instead of a TCP listener.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use doctrans_api::{router, AppState};
use doctrans_core::{BaseSettings, ConfigStore};
use doctrans_jobs::{
    CallbackEngine, EngineSet, Orchestrator, ScriptedCallbackEngine, ScriptedStreamingEngine,
    StreamingEngine,
};

pub const TEST_PDF: &[u8] = b"%PDF-1.4 integration test document";

/// The app under test plus the temp directories backing it. Keep the struct
/// alive for the duration of a test; the directories are removed on drop.
pub struct TestApp {
    pub router: axum::Router,
    pub uploads: tempfile::TempDir,
    pub outputs: tempfile::TempDir,
    pub config_dir: tempfile::TempDir,
}

/// App over a callback engine that reports three ticks and writes a mono
/// artifact, which is what the classic Google/Bing path produces.
pub fn build_test_app() -> TestApp {
    build_test_app_with(
        Arc::new(ScriptedStreamingEngine::completing(None, None)),
        Arc::new(ScriptedCallbackEngine::new(3)),
    )
}

pub fn build_test_app_with(
    streaming: Arc<dyn StreamingEngine>,
    callback: Arc<dyn CallbackEngine>,
) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let outputs = tempfile::tempdir().unwrap();
    let config_dir = tempfile::tempdir().unwrap();

    let store = ConfigStore::new(config_dir.path().join("doctrans.config.json"));
    let orchestrator = Orchestrator::new(
        BaseSettings::default(),
        store,
        EngineSet::new(streaming, callback),
        uploads.path(),
        outputs.path(),
    );
    let state = AppState::new(Arc::new(orchestrator));

    TestApp {
        router: router(state),
        uploads,
        outputs,
        config_dir,
    }
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body: String = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Multipart POST to `/api/upload` with the given filename and bytes.
    pub async fn post_upload(&self, filename: &str, data: &[u8]) -> Response<Body> {
        let boundary = "doctrans-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        self.request(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Upload a test PDF and return its file id.
    pub async fn upload_pdf(&self, filename: &str) -> String {
        let response = self.post_upload(filename, TEST_PDF).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        json["file_id"].as_str().unwrap().to_string()
    }

    /// Start a Google English→Simplified Chinese job for the uploaded file.
    pub async fn start_google_job(&self, file_id: &str) -> String {
        let response = self
            .post_form(
                "/api/translate",
                &[
                    ("file_id", file_id),
                    ("service", "Google"),
                    ("lang_from", "English"),
                    ("lang_to", "Simplified Chinese"),
                    ("page_range", "All"),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        json["job_id"].as_str().unwrap().to_string()
    }

    /// Poll the status endpoint until the job settles.
    pub async fn wait_terminal(&self, job_id: &str) -> serde_json::Value {
        for _ in 0..300 {
            let response = self.get(&format!("/api/status/{job_id}")).await;
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            match json["status"].as_str() {
                Some("completed") | Some("failed") | Some("cancelled") => return json,
                _ => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
            }
        }
        panic!("job {job_id} never settled");
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Minimal percent-encoding for form bodies; test inputs stay ASCII.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
