//! HTTP surface over SQLite-backed storage.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bitbridge_user::auth::JwtAccessVerifier;
use bitbridge_user::interfaces::http::{create_router, HttpState};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> axum::Router {
    create_router(HttpState {
        accounts: common::sqlite_service().await,
        verifier: Arc::new(JwtAccessVerifier::new(common::jwt_config())),
        prometheus: PrometheusBuilder::new().build_recorder().handle(),
    })
}

async fn body_json(resp: axum::http::Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_user(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn registration_and_lookup_flow() {
    let app = app().await;

    let resp = app
        .clone()
        .oneshot(post_user(json!({
            "email": "a@b.com",
            "username": "alice",
            "password": "secret123"
        })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/users/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["username"], "alice");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/a@b.com/private")
                .header(header::AUTHORIZATION, common::bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let data = &body_json(resp).await["data"];
    assert_eq!(data["id"], id.as_str());
    assert_ne!(data["password"], "secret123");
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let app = app().await;
    let first = json!({"email": "a@b.com", "username": "alice", "password": "pw"});
    let second = json!({"email": "c@d.com", "username": "alice", "password": "pw"});

    assert_eq!(
        app.clone().oneshot(post_user(first)).await.unwrap().status(),
        StatusCode::CREATED
    );

    let resp = app.oneshot(post_user(second)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let resp = app()
        .await
        .oneshot(post_user(json!({"email": "a@b.com", "username": "alice"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn keys_the_resolver_cannot_reach_are_rejected() {
    let app = app().await;

    for body in [
        json!({"email": "alice@localhost", "username": "alice", "password": "pw"}),
        json!({"email": "a@b.com", "username": "bob@home.net", "password": "pw"}),
        json!({"email": "a@b.com", "username": "507f1f77bcf86cd799439011", "password": "pw"}),
        json!({"email": "a@b.com", "username": "alice", "password": "a".repeat(73)}),
    ] {
        let resp = app.clone().oneshot(post_user(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/alice@localhost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
