//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by an engine with mock providers, so the HTTP surface can be
//! exercised without any upstream.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use reelhound_core::{
    testing::MockProvider, Capability, Config, Engine, EngineOptions, MemoryCache, Provider,
};
use reelhound_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use reelhound_core::testing::fixtures;

/// Test fixture for API testing with mock providers.
///
/// Provides an in-process router with fully controllable mocks for:
/// - A metadata-only fan-out provider (`tmdb`)
/// - A link-bearing fan-out provider (`yts`)
/// - Two fallback providers (`apibay`, `archive`)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new().await;
///     fixture.yts.set_records(fixtures::inception_records()).await;
///
///     let response = fixture.post("/api/v1/search", json!({ "query": "inception" })).await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub tmdb: Arc<MockProvider>,
    pub yts: Arc<MockProvider>,
    pub apibay: Arc<MockProvider>,
    pub archive: Arc<MockProvider>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with empty mocks.
    pub async fn new() -> Self {
        let tmdb = Arc::new(MockProvider::new("tmdb").with_capability(Capability::Metadata));
        let yts = Arc::new(
            MockProvider::new("yts")
                .with_capability(Capability::Links)
                .with_priority(10),
        );
        let apibay = Arc::new(
            MockProvider::new("apibay")
                .with_capability(Capability::Links)
                .with_priority(20),
        );
        let archive = Arc::new(MockProvider::new("archive").with_priority(50));

        let options = EngineOptions {
            provider_timeout: Duration::from_secs(5),
            per_provider_limit: 10,
            max_titles: 25,
            cache_ttl: Duration::from_secs(60),
        };
        let engine = Engine::new(
            options,
            vec![
                Arc::clone(&tmdb) as Arc<dyn Provider>,
                Arc::clone(&yts) as Arc<dyn Provider>,
            ],
            vec![
                Arc::clone(&archive) as Arc<dyn Provider>,
                Arc::clone(&apibay) as Arc<dyn Provider>,
            ],
            Arc::new(MemoryCache::new()),
        );

        let state = Arc::new(AppState::new(Config::default(), Arc::new(engine)));
        let router = create_router(state);

        Self {
            router,
            tmdb,
            yts,
            apibay,
            archive,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
