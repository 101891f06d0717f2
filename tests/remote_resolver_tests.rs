//! RemoteResolver against a loopback fake auth service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use contextvault::identity::{AllowList, IdentityResolver, RemoteResolver, ResolveError};
use contextvault::server::credentials::CredentialChain;
use contextvault::server::{router, AppState};
use contextvault::vault::ContextVault;
use contextvault::VaultConfig;

async fn fake_resolve(Json(body): Json<Value>) -> Response {
    match body["credential"].as_str().unwrap_or_default() {
        "good" => Json(json!({ "user_id": "u1", "display_name": "Dr. One", "email": "one@example.org" })).into_response(),
        "inactive" => Json(json!({ "user_id": "u2", "active": false })).into_response(),
        "blank" => Json(json!({ "user_id": "  " })).into_response(),
        "gone" => StatusCode::GONE.into_response(),
        "boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "garbage" => (StatusCode::OK, "not json").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "user_id": "late" })).into_response()
        }
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn spawn_fake_auth() -> String {
    let app = Router::new().route("/resolve", post(fake_resolve));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/resolve", addr)
}

fn resolver(url: &str) -> RemoteResolver {
    RemoteResolver::new(url, Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn accepted_credential_yields_principal() {
    let url = spawn_fake_auth().await;
    let p = resolver(&url).resolve("good").await.unwrap();
    assert_eq!(p.identity, "u1");
    assert_eq!(p.display_name.as_deref(), Some("Dr. One"));
    assert_eq!(p.email.as_deref(), Some("one@example.org"));
}

#[tokio::test]
async fn rejections_map_to_resolver_errors() {
    let url = spawn_fake_auth().await;
    let r = resolver(&url);
    assert_eq!(r.resolve("nope").await.unwrap_err(), ResolveError::Invalid);
    assert_eq!(r.resolve("gone").await.unwrap_err(), ResolveError::Expired);
    assert_eq!(r.resolve("inactive").await.unwrap_err(), ResolveError::Inactive);
}

#[tokio::test]
async fn service_faults_are_unavailable() {
    let url = spawn_fake_auth().await;
    let r = resolver(&url);
    for cred in ["boom", "garbage", "blank", "slow"] {
        let err = r.resolve(cred).await.unwrap_err();
        assert!(matches!(err, ResolveError::Unavailable(_)), "{}: {:?}", cred, err);
    }
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let r = resolver(&format!("http://{}/resolve", addr));
    assert!(matches!(r.resolve("good").await.unwrap_err(), ResolveError::Unavailable(_)));
}

#[tokio::test]
async fn router_authenticates_through_remote_service() {
    let url = spawn_fake_auth().await;
    let vault = ContextVault::new(10);
    let state = AppState::new(
        vault.clone(),
        Arc::new(resolver(&url)),
        Arc::new(AllowList::new(Vec::<String>::new())),
        CredentialChain::from_config(&VaultConfig::default()).unwrap(),
        Duration::from_secs(60),
    );
    let app = router(state);

    let req = Request::builder()
        .method("PUT")
        .uri("/context")
        .header("x-session-id", "good")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"resource_ref":"p1"}"#))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(vault.read("u1").unwrap().display_meta.as_deref(), Some("Dr. One"));

    let req = Request::builder()
        .method("GET")
        .uri("/context")
        .header("cookie", "session_id=boom")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
