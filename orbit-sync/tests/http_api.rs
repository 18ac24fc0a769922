//! HTTP gateway tests, driven through the router without a socket.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use orbit_sync::api::build_router;
use orbit_sync::protocol::{Envelope, EVENT_CONFIG_UPDATED};
use orbit_sync::{CaptureError, Capturer, StaticToken, SyncContext};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const MAX_BODY: usize = 1024 * 1024;

fn app(ctx: &SyncContext) -> Router {
    build_router(ctx.clone(), MAX_BODY)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

struct FixedCapture(&'static [u8]);

#[async_trait]
impl Capturer for FixedCapture {
    async fn capture(&self, _url: &str) -> Result<Vec<u8>, CaptureError> {
        Ok(self.0.to_vec())
    }
}

struct BrokenCapture;

#[async_trait]
impl Capturer for BrokenCapture {
    async fn capture(&self, _url: &str) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Failed("browser crashed".into()))
    }
}

#[tokio::test]
async fn update_fills_defaults_and_broadcasts() {
    let ctx = SyncContext::in_memory(8);
    let mut sub = ctx.hub().subscribe().await;

    let response = app(&ctx)
        .oneshot(json_request(
            "POST",
            "/api/button/config",
            json!({"id": "b1", "position": {"x": 1, "y": 2, "z": 3}, "label": "Play"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["id"], "b1");
    assert_eq!(body["data"]["rotation"], json!({"x": 0.0, "y": 0.0, "z": 0.0}));
    assert_eq!(body["data"]["scale"], 1.0);
    assert_eq!(body["data"]["label"], "Play");

    let env = Envelope::decode(&sub.try_recv().unwrap()).unwrap();
    assert_eq!(env.event, EVENT_CONFIG_UPDATED);
    assert_eq!(env.data, body["data"]);
}

#[tokio::test]
async fn update_without_id_is_rejected() {
    let ctx = SyncContext::in_memory(8);
    let mut sub = ctx.hub().subscribe().await;

    let response = app(&ctx)
        .oneshot(json_request("POST", "/api/button/config", json!({"scale": 2})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());

    assert!(sub.try_recv().is_none());
    assert_eq!(ctx.store().count().unwrap(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let ctx = SyncContext::in_memory(8);
    let request = Request::builder()
        .method("POST")
        .uri("/api/button/config")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&ctx).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["status"], "error");
}

#[tokio::test]
async fn list_and_get_return_stored_records() {
    let ctx = SyncContext::in_memory(8);
    let router = app(&ctx);

    for id in ["b1", "b2"] {
        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/button/config", json!({"id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body = read_json(router.clone().oneshot(get("/api/button/config")).await.unwrap()).await;
    assert_eq!(body["status"], "success");
    let data = body["data"].as_object().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data["b2"]["id"], "b2");

    let response = router.clone().oneshot(get("/api/button/config/b1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["data"]["id"], "b1");

    let response = router.oneshot(get("/api/button/config/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_on_empty_store_is_empty_object() {
    let ctx = SyncContext::in_memory(8);
    let body = read_json(app(&ctx).oneshot(get("/api/button/config")).await.unwrap()).await;
    assert_eq!(body["data"], json!({}));
}

#[tokio::test]
async fn static_token_gates_writes() {
    let ctx = SyncContext::in_memory(8).with_authorizer(Arc::new(StaticToken::new("s3cret")));
    let router = app(&ctx);

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/button/config", json!({"id": "b1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.store().count().unwrap(), 0);

    let mut request = json_request("POST", "/api/button/config", json!({"id": "b1"}));
    request
        .headers_mut()
        .insert("authorization", "Bearer s3cret".parse().unwrap());
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.store().count().unwrap(), 1);
}

#[tokio::test]
async fn capture_requires_url() {
    let ctx = SyncContext::in_memory(8).with_capturer(Arc::new(FixedCapture(b"<html/>")));
    let response = app(&ctx)
        .oneshot(json_request("POST", "/api/browser/capture", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn capture_returns_base64_content() {
    let ctx = SyncContext::in_memory(8).with_capturer(Arc::new(FixedCapture(b"<html/>")));
    let response = app(&ctx)
        .oneshot(json_request(
            "POST",
            "/api/browser/capture",
            json!({"url": "http://example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["url"], "http://example.com");
    assert_eq!(body["content"], "PGh0bWwvPg==");
}

#[tokio::test]
async fn capture_failure_is_bad_gateway() {
    let router_for = |capturer: Arc<dyn Capturer>| app(&SyncContext::in_memory(8).with_capturer(capturer));

    for router in [router_for(Arc::new(BrokenCapture)), app(&SyncContext::in_memory(8))] {
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/browser/capture",
                json!({"url": "http://example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(read_json(response).await["status"], "error");
    }
}

#[tokio::test]
async fn health_reports_counts() {
    let ctx = SyncContext::in_memory(8);
    let _sub = ctx.hub().subscribe().await;
    ctx.synchronizer().apply_update(json!({"id": "b1"})).await.unwrap();

    let response = app(&ctx).oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"status": "ok", "subscribers": 1, "buttons": 1, "durable": false})
    );
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let ctx = SyncContext::in_memory(8);
    let response = app(&ctx).oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await,
        json!({"error": "Not found", "message": "The requested resource does not exist"})
    );
}
