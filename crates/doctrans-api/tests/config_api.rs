//! Integration tests for the engine catalog endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app};

// ---------------------------------------------------------------------------
// Test: /api/config carries languages, services, term services, backends
// ---------------------------------------------------------------------------

#[tokio::test]
async fn config_lists_languages_with_codes() {
    let app = build_test_app();
    let response = app.get("/api/config").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let languages = json["languages"].as_array().unwrap();
    assert!(languages
        .iter()
        .any(|l| l["label"] == "English" && l["code"] == "en"));
    assert!(languages
        .iter()
        .any(|l| l["label"] == "Simplified Chinese" && l["code"] == "zh-CN"));
}

#[tokio::test]
async fn config_lists_services_with_backend_and_fields() {
    let app = build_test_app();
    let json = body_json(app.get("/api/config").await).await;
    let services = json["services"].as_array().unwrap();

    let google = services.iter().find(|s| s["name"] == "Google").unwrap();
    assert_eq!(google["backend"], "callback");
    assert!(google["fields"].as_array().unwrap().is_empty());

    let openai = services.iter().find(|s| s["name"] == "OpenAI").unwrap();
    assert_eq!(openai["backend"], "streaming");
    let fields = openai["fields"].as_array().unwrap();
    let api_key = fields
        .iter()
        .find(|f| f["name"] == "openai_api_key")
        .unwrap();
    assert_eq!(api_key["sensitive"], true);
    assert_eq!(api_key["kind"], "string");
}

#[tokio::test]
async fn config_term_services_follow_main_engine_first() {
    let app = build_test_app();
    let json = body_json(app.get("/api/config").await).await;
    let term_services = json["term_services"].as_array().unwrap();

    assert_eq!(term_services[0], "Follow main translation engine");
    assert!(term_services.iter().any(|s| s == "OpenAI"));
    // The classic engines cannot drive term extraction.
    assert!(!term_services.iter().any(|s| s == "Google"));
}

#[tokio::test]
async fn config_probes_both_backends() {
    let app = build_test_app();
    let json = body_json(app.get("/api/config").await).await;
    let backends = json["backends"].as_array().unwrap();
    assert_eq!(backends.len(), 2);

    for kind in ["streaming", "callback"] {
        let entry = backends.iter().find(|b| b["kind"] == kind).unwrap();
        assert_eq!(entry["available"], true, "{kind} should be available");
        assert_eq!(entry["version"], "scripted");
    }
}
