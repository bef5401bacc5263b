//! API tests against an in-process router with mock providers.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};
use reelhound_core::RawRecord;

fn heat() -> RawRecord {
    RawRecord::new("Heat", "tmdb")
        .with_year(Some(1995))
        .with_rating(Some(8.3))
}

/// Search "heat" in a fresh session: Inception (with links) ranks first,
/// Heat (metadata only) second.
async fn search_session(fixture: &TestFixture) -> String {
    fixture.tmdb.set_records(vec![heat()]).await;
    fixture
        .yts
        .set_records(vec![fixtures::inception_records()[0].clone()])
        .await;

    let response = fixture
        .post("/api/v1/search", json!({ "query": "heat" }))
        .await;
    assert_status!(response, StatusCode::OK);
    response.body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_served() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 8080);
    assert_eq!(response.body["engine"]["provider_timeout_secs"], 15);
}

#[tokio::test]
async fn test_providers_listed_in_probe_order() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/providers").await;

    assert_status!(response, StatusCode::OK);
    let names = |list: &str| -> Vec<String> {
        response.body[list]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(names("fan_out"), vec!["tmdb", "yts"]);
    assert_eq!(names("fallback"), vec!["apibay", "archive"]);
    assert_eq!(response.body["fan_out"][0]["capability"], "metadata");
}

#[tokio::test]
async fn test_search_returns_ranked_titles() {
    let fixture = TestFixture::new().await;
    fixture.tmdb.set_records(vec![heat()]).await;
    fixture
        .yts
        .set_records(vec![fixtures::inception_records()[0].clone()])
        .await;

    let response = fixture
        .post("/api/v1/search", json!({ "query": "heat" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "found");
    assert_eq!(response.body["committed"], true);
    assert_eq!(response.body["titles"][0]["title"], "Inception");
    assert_eq!(response.body["titles"][1]["title"], "Heat");
    assert_eq!(response.body["providers"][0]["provider"], "tmdb");
    assert_eq!(response.body["providers"][0]["status"], "fresh");
    assert_eq!(response.body["providers"][0]["records"], 1);
}

#[tokio::test]
async fn test_search_without_results() {
    let fixture = TestFixture::new().await;
    fixture.yts.set_always_fail(true).await;

    let response = fixture
        .post("/api/v1/search", json!({ "query": "nothing" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "no_results");
    assert_eq!(response.body["titles"], json!([]));
    assert_eq!(response.body["providers"][1]["status"], "failed");
    assert_eq!(response.body["providers"][1]["error"], "unavailable");
}

#[tokio::test]
async fn test_blank_query_calls_no_provider() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/search", json!({ "query": "   " }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "no_results");
    assert_eq!(fixture.tmdb.search_count().await, 0);
    assert_eq!(fixture.yts.search_count().await, 0);
}

#[tokio::test]
async fn test_master_title_from_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/search",
            json!({ "query": "Схватка", "master_title": "Heat", "master_year": 1995 }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["query"]["master_title"], "Heat");
    // Mocks do not prefer the master title, so they get the raw text.
    assert_eq!(fixture.yts.searched_terms().await, vec!["Схватка"]);
}

#[tokio::test]
async fn test_session_titles() {
    let fixture = TestFixture::new().await;
    let session_id = search_session(&fixture).await;

    let response = fixture
        .get(&format!("/api/v1/sessions/{}/titles", session_id))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["query"]["text"], "heat");
    assert_eq!(response.body["titles"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/sessions/nope/titles").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture
        .post("/api/v1/sessions/nope/titles/0/resolve", json!({}))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolve_writes_links_back_to_session() {
    let fixture = TestFixture::new().await;
    let session_id = search_session(&fixture).await;
    fixture
        .apibay
        .set_links(vec![fixtures::torrent_link("1080p", 42, "apibay")])
        .await;

    let response = fixture
        .post(
            &format!("/api/v1/sessions/{}/titles/1/resolve", session_id),
            json!({}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"]["status"], "resolved");
    assert_eq!(response.body["outcome"]["provider"], "apibay");
    assert_eq!(response.body["probed"], json!(["apibay"]));
    assert_eq!(response.body["updated"], true);
    assert_eq!(fixture.archive.resolve_count().await, 0);

    let titles = fixture
        .get(&format!("/api/v1/sessions/{}/titles", session_id))
        .await;
    assert_eq!(titles.body["titles"][1]["links"][0]["seeds"], 42);
}

#[tokio::test]
async fn test_resolve_exhausted() {
    let fixture = TestFixture::new().await;
    let session_id = search_session(&fixture).await;

    let response = fixture
        .post(
            &format!("/api/v1/sessions/{}/titles/1/resolve", session_id),
            json!({}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"]["status"], "exhausted");
    assert_eq!(response.body["probed"], json!(["apibay", "archive"]));
    assert_eq!(response.body["updated"], false);
}

#[tokio::test]
async fn test_resolve_title_with_links_is_noop() {
    let fixture = TestFixture::new().await;
    let session_id = search_session(&fixture).await;

    let response = fixture
        .post(
            &format!("/api/v1/sessions/{}/titles/0/resolve", session_id),
            json!({}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"]["status"], "already_resolved");
    assert_eq!(fixture.apibay.resolve_count().await, 0);
}

#[tokio::test]
async fn test_resolve_index_out_of_range() {
    let fixture = TestFixture::new().await;
    let session_id = search_session(&fixture).await;

    let response = fixture
        .post(
            &format!("/api/v1/sessions/{}/titles/9/resolve", session_id),
            json!({}),
        )
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_search_replaces_working_set() {
    let fixture = TestFixture::new().await;
    let session_id = search_session(&fixture).await;

    fixture.yts.set_records(Vec::new()).await;
    let response = fixture
        .post(
            "/api/v1/search",
            json!({ "session_id": session_id, "query": "something else" }),
        )
        .await;
    assert_eq!(response.body["session_id"], session_id.as_str());

    let titles = fixture
        .get(&format!("/api/v1/sessions/{}/titles", session_id))
        .await;
    assert_eq!(titles.body["query"]["text"], "something else");
    assert_eq!(titles.body["titles"][0]["title"], "Heat");
    assert_eq!(titles.body["titles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("reelhound_http_requests_total"));
    assert!(body.contains("reelhound_sessions_active"));
}
