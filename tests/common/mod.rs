#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use todo_lists::{
    build_router, notify::BroadcastNotifier, repository::InMemoryRepository, state::AppState,
};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub notifier: BroadcastNotifier,
}

pub fn app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let notifier = BroadcastNotifier::new();
    let (state, _worker) = AppState::start(repo.clone(), Arc::new(notifier.clone()))
        .expect("state should build");
    TestApp {
        router: build_router(state),
        repo,
        notifier,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.body).expect("body should be valid JSON")
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let header_value = |name| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header_value(header::CONTENT_TYPE);
    let location = header_value(header::LOCATION);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    TestResponse {
        status,
        content_type,
        location,
        body: String::from_utf8(bytes.to_vec()).expect("body should be UTF-8"),
    }
}

pub async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    payload: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request should build");
    let response = send(router, request).await;
    (response.status, response.json())
}

pub async fn send_empty(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .expect("request should build");
    let response = send(router, request).await;
    (response.status, response.json())
}

pub async fn send_form(router: &Router, method: Method, uri: &str, form: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::ACCEPT, "text/vnd.turbo-stream.html")
        .body(Body::from(form.to_string()))
        .expect("request should build");
    send(router, request).await
}

pub async fn get_html(router: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .expect("request should build");
    send(router, request).await
}

pub async fn create_list(router: &Router, name: &str) -> i64 {
    let (status, body) = send_json(
        router,
        Method::POST,
        "/api/v1/todolists",
        json!({ "todo_list": { "name": name } }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("created list should have id")
}

pub async fn create_item(router: &Router, list_id: i64, item: Value) -> Value {
    let (status, body) = send_json(
        router,
        Method::POST,
        &format!("/api/v1/todolists/{list_id}/items"),
        json!({ "item": item }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

/// Polls until `check` holds; the bulk job runs on another task.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition should hold before the timeout");
}
