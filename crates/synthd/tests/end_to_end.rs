//! End-to-end tests: the full router and pipeline against a mock
//! ingestion/storage service.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use http_body_util::BodyExt;
use tower::ServiceExt;

use synth_api::build_router;
use synth_core::{MonitorConfig, SyntheticRecord};
use synth_pipeline::Monitor;

struct Backend {
    ingest_status: u16,
    serve_object: bool,
    stored: Option<Vec<u8>>,
}

type Shared = Arc<Mutex<Backend>>;

async fn notify(State(backend): State<Shared>, body: Bytes) -> StatusCode {
    let record: SyntheticRecord = serde_json::from_slice(&body).unwrap();
    let mut backend = backend.lock().unwrap();
    backend.stored = Some(record.payload_bytes().unwrap());
    StatusCode::from_u16(backend.ingest_status).unwrap()
}

async fn object(State(backend): State<Shared>) -> Response {
    let backend = backend.lock().unwrap();
    match (&backend.stored, backend.serve_object) {
        (Some(bytes), true) => (StatusCode::OK, bytes.clone()).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_backend(ingest_status: u16, serve_object: bool) -> (SocketAddr, Shared) {
    let backend = Arc::new(Mutex::new(Backend {
        ingest_status,
        serve_object,
        stored: None,
    }));
    let app = Router::new()
        .route("/notify", post(notify))
        .route("/{uuid}", get(object))
        .with_state(Arc::clone(&backend));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, backend)
}

fn monitor_for(addr: SocketAddr) -> Monitor {
    let config = MonitorConfig {
        ingest_host: addr.to_string(),
        storage_host: addr.to_string(),
        tick: false,
        settle_window: Duration::from_millis(20),
        request_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let (monitor, _workers) = Monitor::builder(config).start();
    monitor
}

async fn call(router: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn wait_for_history(monitor: &Monitor, len: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while monitor.history().len() < len {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("history did not fill in time");
}

#[tokio::test]
async fn fresh_monitor_is_good_to_go() {
    let (addr, _backend) = spawn_backend(200, true).await;
    let router = build_router(monitor_for(addr));

    let (status, body) = call(&router, "GET", "/__gtg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = call(&router, "GET", "/history").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn forced_publish_is_verified_and_recorded() {
    let (addr, _backend) = spawn_backend(200, true).await;
    let monitor = monitor_for(addr);
    let router = build_router(monitor.clone());

    let (status, body) = call(&router, "POST", "/forcePublish").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("SYNTHETIC-REQ-MON_"));

    wait_for_history(&monitor, 1).await;
    let (_, history) = call(&router, "GET", "/history").await;
    assert!(history.starts_with("1. { Date: "));
    assert!(history.contains("Succeeded: true"));

    let (status, _) = call(&router, "GET", "/__gtg").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rejected_forced_publish_fails_the_response_and_health() {
    let (addr, _backend) = spawn_backend(500, true).await;
    let monitor = monitor_for(addr);
    let router = build_router(monitor.clone());

    let (status, body) = call(&router, "POST", "/forcePublish").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("500"));

    wait_for_history(&monitor, 1).await;
    let (status, body) = call(&router, "GET", "/__gtg").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Image publication doesn't work");

    let (status, body) = call(&router, "GET", "/__health").await;
    assert_eq!(status, StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(doc["ok"], false);
}

#[tokio::test]
async fn missing_object_turns_health_red_then_recovers() {
    let (addr, backend) = spawn_backend(200, false).await;
    let monitor = monitor_for(addr);
    let router = build_router(monitor.clone());

    let (status, _) = call(&router, "GET", "/forcePublish").await;
    assert_eq!(status, StatusCode::OK);
    wait_for_history(&monitor, 1).await;

    let (status, _) = call(&router, "GET", "/__gtg").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (_, history) = call(&router, "GET", "/history").await;
    assert!(history.contains("Image not found"));

    backend.lock().unwrap().serve_object = true;
    let (status, _) = call(&router, "POST", "/forcePublish").await;
    assert_eq!(status, StatusCode::OK);
    wait_for_history(&monitor, 2).await;

    let (status, _) = call(&router, "GET", "/__gtg").await;
    assert_eq!(status, StatusCode::OK);

    // Most recent first.
    let (_, history) = call(&router, "GET", "/history").await;
    let first = history.lines().next().unwrap();
    assert!(first.contains("Succeeded: true"));
}

#[tokio::test]
async fn health_queries_never_publish() {
    let (addr, backend) = spawn_backend(200, true).await;
    let monitor = monitor_for(addr);
    let router = build_router(monitor.clone());

    for uri in ["/__health", "/__gtg", "/history"] {
        let (status, _) = call(&router, "GET", uri).await;
        assert_eq!(status, StatusCode::OK);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(backend.lock().unwrap().stored.is_none());
    assert!(monitor.history().is_empty());
}
