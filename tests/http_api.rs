use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use greeter::application::greetings::GreetingService;
use greeter::cache::{CacheConfig, build_cache};
use greeter::infra::events;
use greeter::infra::http::{HttpState, build_router};
use greeter::infra::memory::InMemoryGreetingStore;

fn app() -> Router {
    let (publisher, listener) = events::channel(
        NonZeroUsize::new(64).expect("non-zero"),
        Duration::from_millis(100),
    );
    tokio::spawn(listener.run(Arc::new(
        greeter::application::events::LoggingGreetingEventHandler,
    )));
    let service = GreetingService::new(
        Arc::new(InMemoryGreetingStore::new()),
        build_cache(&CacheConfig::default()),
        Arc::new(publisher),
    );
    build_router(HttpState {
        greetings: Arc::new(service),
        db: None,
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router should respond");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

#[tokio::test]
async fn create_then_get_round_trips_over_http() {
    let app = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/greetings",
        Some(json!({ "name": "World" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Hello, World!");
    let id = created["id"].as_str().expect("id string").to_string();

    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/greetings/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/greetings/{id}/cache"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, refetched) =
        send(&app, Method::GET, &format!("/api/v1/greetings/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refetched, created);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/cache", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_greeting_is_404() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/greetings/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn malformed_id_is_400() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/greetings/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_id");
    assert!(body["error"]["hint"].is_string());
}

#[tokio::test]
async fn invalid_names_are_400() {
    let app = app();

    for payload in [
        json!({ "name": "   " }),
        json!({ "name": "x".repeat(101) }),
        json!({ "nom": "World" }),
    ] {
        let (status, body) = send(&app, Method::POST, "/api/v1/greetings", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_input");
    }
}

#[tokio::test]
async fn db_health_without_database_is_no_content() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/_health/db", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = app();

    let generated = app
        .clone()
        .oneshot(
            Request::get("/api/v1/greetings/not-a-uuid")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    assert_eq!(generated.status(), StatusCode::BAD_REQUEST);
    let id = generated
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .expect("generated request id");
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let echoed = app
        .oneshot(
            Request::get("/_health/db")
                .header("x-request-id", "trace-abc")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    assert_eq!(
        echoed
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("trace-abc")
    );
}
