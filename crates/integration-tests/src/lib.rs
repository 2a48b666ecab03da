//! Shared harness for the HTTP integration tests.
//!
//! Builds the full router over a fresh store and drives it in-process with
//! `tower::ServiceExt::oneshot`; no socket is opened.

use std::sync::Arc;

use api_adapters::{build_router, AppState};
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use domains::ThreadStore;
use serde_json::Value;
use services::{BoardRules, BoardService};
use storage_adapters::MemoryThreadStore;
use tower::ServiceExt;

pub const BOARD: &str = "general";

/// The application router plus request helpers.
pub struct TestApp {
    router: Router,
}

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is not UTF-8")
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("response body is not JSON ({e}): {}", self.text()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

impl TestApp {
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryThreadStore::new()))
    }

    #[cfg(feature = "db-sqlite")]
    pub async fn sqlite() -> Self {
        let store = storage_adapters::SqliteThreadStore::in_memory()
            .await
            .expect("Failed to create in-memory SQLite store");
        Self::with_store(Arc::new(store))
    }

    pub fn with_store(store: Arc<dyn ThreadStore>) -> Self {
        Self::with_options(store, BoardRules::default(), &[])
    }

    pub fn with_options(
        store: Arc<dyn ThreadStore>,
        rules: BoardRules,
        cors_origins: &[String],
    ) -> Self {
        let service = BoardService::new(store, rules);
        Self {
            router: build_router(AppState::new(service), cors_origins),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    /// Sends an already url-encoded body.
    pub async fn form(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .expect("valid request");
        self.send(request).await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.send(request).await
    }

    /// Posts a thread and returns its id as listed on the board.
    pub async fn create_thread(&self, board: &str, text: &str, password: &str) -> String {
        let response = self
            .json(
                Method::POST,
                &format!("/api/threads/{board}"),
                serde_json::json!({ "text": text, "delete_password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());

        let listing = self.list_threads(board).await;
        listing
            .as_array()
            .and_then(|threads| threads.iter().find(|t| t["text"] == text))
            .and_then(|t| t["_id"].as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| panic!("thread {text:?} not listed on /{board}/"))
    }

    /// Posts a reply and returns its id.
    pub async fn create_reply(
        &self,
        board: &str,
        thread_id: &str,
        text: &str,
        password: &str,
    ) -> String {
        let response = self
            .json(
                Method::POST,
                &format!("/api/replies/{board}"),
                serde_json::json!({
                    "thread_id": thread_id,
                    "text": text,
                    "delete_password": password,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());

        let thread = self.show_thread(board, thread_id).await;
        thread["replies"][0]["_id"]
            .as_str()
            .map(str::to_owned)
            .expect("newest reply comes first")
    }

    pub async fn list_threads(&self, board: &str) -> Value {
        let response = self.get(&format!("/api/threads/{board}")).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()
    }

    pub async fn show_thread(&self, board: &str, thread_id: &str) -> Value {
        let response = self
            .get(&format!("/api/replies/{board}?thread_id={thread_id}"))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()
    }
}

/// Asserts that no stored-only field leaked into a thread or reply payload.
pub fn assert_public_fields_only(value: &Value) {
    let text = value.to_string();
    assert!(!text.contains("delete_password"), "leaked password: {text}");
    assert!(!text.contains("\"reported\""), "leaked report flag: {text}");
}

/// Declares each listed scenario once per backend.
///
/// Every scenario is an `async fn(TestApp)` in the invoking test file.
#[macro_export]
macro_rules! for_each_backend {
    ($($scenario:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario($crate::TestApp::in_memory()).await;
                }
            )*
        }

        #[cfg(feature = "db-sqlite")]
        mod sqlite {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario($crate::TestApp::sqlite().await).await;
                }
            )*
        }
    };
}
