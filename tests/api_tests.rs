mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceExt;
use volunteer_portal::{
    AppConfig, AppState, NavigationGuard, RouteTable, SessionTokenVerifier,
    config::Env,
    create_router,
    identity::StaticIdentityProvider,
    models::Identity,
};

const TEST_SECRET: &str = "api-test-secret";

fn app(env: Env) -> Router {
    let config = AppConfig {
        env,
        session_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    };
    let guard = NavigationGuard::new(
        Arc::new(RouteTable::app()),
        Arc::new(StaticIdentityProvider::signed_out()),
        Arc::new(common::seeded_store()),
    );

    create_router(AppState {
        guard,
        sessions: SessionTokenVerifier::new(TEST_SECRET),
        config,
    })
}

fn token_for(id: &str) -> String {
    SessionTokenVerifier::new(TEST_SECRET)
        .issue(&Identity::new(id), Duration::from_secs(3600))
        .unwrap()
}

fn decide_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/api/navigation/decide")
        .header(header::CONTENT_TYPE, "application/json")
}

fn decide_body(target: &str) -> Body {
    Body::from(json!({ "target": target, "current": "/" }).to_string())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- API ---

#[tokio::test]
async fn test_health_check() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app(Env::Local)).await.unwrap();
    });

    let response = reqwest::get(format!("{}/health", address)).await.unwrap();
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_route_catalogue() {
    let response = app(Env::Local)
        .oneshot(Request::get("/api/routes").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let routes = json_body(response).await;
    let routes = routes.as_array().unwrap();
    assert_eq!(routes.len(), 10);
    assert_eq!(routes[0]["path"], "/login");
    assert_eq!(
        routes[9]["requirement"],
        json!({ "kind": "authenticated_with_role", "role": "admin" })
    );
}

#[tokio::test]
async fn test_decide_with_local_bypass() {
    let response = app(Env::Local)
        .oneshot(
            decide_request()
                .header("x-user-id", "u1")
                .body(decide_body("/admin-panel"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "decision": "redirect_to", "path": "/" })
    );
}

#[tokio::test]
async fn test_decide_with_bearer_token() {
    let response = app(Env::Production)
        .oneshot(
            decide_request()
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for("u4")))
                .body(decide_body("/admin-panel"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(json_body(response).await, json!({ "decision": "proceed" }));
}

#[tokio::test]
async fn test_decide_without_credentials() {
    let response = app(Env::Local)
        .oneshot(
            decide_request()
                .body(decide_body("/account-elder"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        json!({ "decision": "redirect_to", "path": "/login" })
    );
}

#[tokio::test]
async fn test_decide_unknown_target() {
    let response = app(Env::Local)
        .oneshot(decide_request().body(decide_body("/nowhere")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- Page Shell ---

#[tokio::test]
async fn test_page_allowed_returns_descriptor() {
    let response = app(Env::Production)
        .oneshot(
            Request::get("/free-help")
                .header(header::COOKIE, format!("theme=dark; session={}", token_for("u3")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "path": "/free-help", "name": null, "component": "FreeHelpView" })
    );
}

#[tokio::test]
async fn test_page_denied_redirects() {
    let response = app(Env::Local)
        .oneshot(Request::get("/account-elder").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    let response = app(Env::Local)
        .oneshot(
            Request::get("/volunteer-area")
                .header("x-user-id", "u2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_bypass_header_ignored_in_production() {
    let response = app(Env::Production)
        .oneshot(
            Request::get("/admin-panel")
                .header("x-user-id", "u4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_public_page_and_unknown_page() {
    let response = app(Env::Local)
        .oneshot(Request::get("/about").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["component"], "AboutView");

    let response = app(Env::Local)
        .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(Env::Local)
        .oneshot(Request::post("/about").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
