//! End-to-end gateway tests against the in-process harness.
//!
//! The router runs over a memory store, memory cache, and a spawned worker,
//! exercising the same validate -> dispatch -> await path production uses.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use motorid_api::{create_api_router, ApiConfig, AppState};
use motorid_core::new_person_id;
use motorid_storage::{PersonStore, SnapshotCache};
use motorid_test_utils::{spawn_test_stack, TestStack};

fn test_app(stack: &TestStack) -> Router {
    let state = AppState::new(stack.shared_cache(), stack.bus.clone());
    create_api_router(state, &ApiConfig::default())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn create_then_get_roundtrip() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "A", "identity_no": "X1", "phone": "111"}]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let summaries = body_json(response).await;
    let id = summaries[0]["id"].as_str().expect("id").to_string();
    assert_eq!(summaries[0]["name"], "A");
    assert_eq!(summaries[0]["identity_no"], "X1");

    // The lookup is served from the cache and carries the full snapshot.
    let response = app
        .oneshot(get(&format!("/api/v1/persons/{id}")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let person = body_json(response).await;
    assert_eq!(person["id"].as_str(), Some(id.as_str()));
    assert_eq!(person["phone"], "111");
    assert_eq!(person["verified"], false);
    assert_eq!(person["email"], Value::Null);
}

#[tokio::test]
async fn resubmit_keeps_id_and_phone() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "A", "identity_no": "X1", "phone": "111"}]),
        ))
        .await
        .expect("response");
    let first = body_json(response).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "A2", "identity_no": "X1"}]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;

    assert_eq!(first[0]["id"], second[0]["id"]);
    assert_eq!(second[0]["name"], "A2");

    let id = second[0]["id"].as_str().expect("id");
    let response = app
        .oneshot(get(&format!("/api/v1/persons/{id}")))
        .await
        .expect("response");
    let person = body_json(response).await;
    assert_eq!(person["name"], "A2");
    assert_eq!(person["phone"], "111");
}

#[tokio::test]
async fn validation_failures_are_pure_no_ops() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    // Empty batch.
    let response = app
        .clone()
        .oneshot(post_json("/api/v1/persons", json!([])))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing name.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "", "identity_no": "X1"}]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_FIELD");

    // Blank identity_no on setPersonVerified.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons/verification",
            json!({"identity_no": "  ", "flag": true}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // View update without any view field.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons/views",
            json!([{"pid": new_person_id()}]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No command was published, nothing was written anywhere.
    assert_eq!(stack.bus.pending_calls(), 0);
    assert!(stack.store.list_active().await.expect("list").is_empty());
    assert_eq!(stack.cache.count().await.expect("count"), 0);
}

#[tokio::test]
async fn malformed_person_id_is_bad_request() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    let response = app
        .oneshot(get("/api/v1/persons/not-a-uuid"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_ids_return_404() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/persons/{}", new_person_id())))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons/views",
            json!([{"pid": new_person_id(), "identity_frontal_view": "https://img/f.jpg"}]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post_json(
            "/api/v1/persons/verification",
            json!({"identity_no": "missing", "flag": true}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verified_person_survives_bulk_resubmission() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    app.clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "A", "identity_no": "X1", "phone": "111"}]),
        ))
        .await
        .expect("response");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons/verification",
            json!({"identity_no": "X1", "flag": true}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Success");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "Imposter", "identity_no": "X1", "phone": "999"}]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let summaries = body_json(response).await;
    assert_eq!(summaries[0]["name"], "A");

    let row = stack
        .store
        .get_active_by_identity_no("X1")
        .await
        .expect("read")
        .expect("row");
    assert_eq!(row.name, "A");
    assert!(row.verified);
}

#[tokio::test]
async fn refresh_without_body_resyncs_everything() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    app.clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([
                {"name": "A", "identity_no": "X1"},
                {"name": "B", "identity_no": "X2"}
            ]),
        ))
        .await
        .expect("response");

    // Delete one person out of band; the stale entry lingers until resync.
    let victim = stack
        .store
        .get_active_by_identity_no("X2")
        .await
        .expect("read")
        .expect("row")
        .id;
    stack.store.soft_delete(victim);
    assert_eq!(stack.cache.count().await.expect("count"), 2);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/persons/refresh")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Success");

    assert_eq!(stack.cache.count().await.expect("count"), 1);
    assert!(stack.cache.get(victim).await.expect("read").is_none());
}

#[tokio::test]
async fn views_attach_and_survive_in_cache() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons",
            json!([{"name": "A", "identity_no": "X1"}]),
        ))
        .await
        .expect("response");
    let id = body_json(response).await[0]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/persons/views",
            json!([{
                "pid": id,
                "identity_frontal_view": "https://img/front.jpg",
                "identity_rear_view": "https://img/rear.jpg"
            }]),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([id]));

    let response = app
        .oneshot(get(&format!("/api/v1/persons/{id}")))
        .await
        .expect("response");
    let person = body_json(response).await;
    assert_eq!(person["identity_frontal_view"], "https://img/front.jpg");
    assert_eq!(person["identity_rear_view"], "https://img/rear.jpg");
    assert_eq!(person["license_frontal_view"], Value::Null);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let stack = spawn_test_stack();
    let app = test_app(&stack);

    for uri in ["/health/ping", "/health/live", "/health/ready"] {
        let response = app.clone().oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_json(response).await["status"], "healthy", "{uri}");
    }
}
