#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use signage_api::config::ServerConfig;
use signage_api::router::build_app_router;
use signage_api::state::{AppState, Runner};
use signage_api::ws::WsManager;
use signage_events::EventBus;
use signage_fal::{FalApi, FalConfig};
use signage_pipeline::{FileStorage, RunnerSettings};

/// User id every test request acts as.
pub const TEST_USER_ID: i64 = 1;

/// Build a test `ServerConfig` with safe defaults.
///
/// Storage goes to a fresh directory under the system temp dir and no
/// generation API key is set, so generation requests fail without any
/// network traffic.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage_root: std::env::temp_dir().join(format!("signage-test-{}", uuid::Uuid::new_v4())),
        public_files_prefix: "/files".to_string(),
        max_upload_bytes: 1024 * 1024,
        fal: FalConfig::default(),
        poll_interval: Duration::from_millis(20),
        poll_timeout: Duration::from_secs(2),
        stub_user_id: TEST_USER_ID,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

/// Like [`build_test_app`] with an explicit configuration, for tests that
/// need to reach into the storage directory.
pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let event_bus = Arc::new(EventBus::default());
    let fal = FalApi::new(config.fal.clone()).expect("client builds");
    let storage = FileStorage::new(&config.storage_root, &config.public_files_prefix);
    let runner = Arc::new(Runner::new(
        pool.clone(),
        Arc::new(fal),
        storage,
        Arc::clone(&event_bus),
        RunnerSettings {
            poll_interval: config.poll_interval,
            poll_timeout: config.poll_timeout,
        },
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus,
        runner,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<axum::body::Body> {
    app.oneshot(request).await.expect("request is handled")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Request::put(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// POST a multipart form. Each part is `(field name, file name, content type, bytes)`;
/// parts without a file name are plain text fields.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    parts: &[(&str, Option<&str>, Option<&str>, &[u8])],
) -> Response<Body> {
    const BOUNDARY: &str = "signage-test-boundary";
    let mut body = Vec::new();
    for (name, file_name, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
            ),
        }
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        Request::post(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes()
        .to_vec()
}

/// A small valid PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    image::RgbaImage::new(width, height)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("png encodes");
    out
}
