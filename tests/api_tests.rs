use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use vestor::config::Config;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // One pooled connection: every connection to an in-memory SQLite URL
    // opens its own empty database.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let state = vestor::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    vestor::api::router(state).await
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, email: &str, password: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "email": email,
                "password": password,
                "display_name": "Test User"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("vestor_session="));

    let body = body_json(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

fn bearer_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn bearer_post(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(bearer_get("/api/system/status", "not-a-real-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let app = spawn_app().await;

    register(&app, "alice@example.com", "Sup3rSecret").await;
    let token = login(&app, "alice@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(bearer_get("/api/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["tier"], "free");
    assert_eq!(body["data"]["email_verified"], false);
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "email": "not-an-email", "password": "Sup3rSecret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "email": "bob@example.com", "password": "weak" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    register(&app, "bob@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "email": "bob@example.com", "password": "Sup3rSecret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = spawn_app().await;

    register(&app, "carol@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "carol@example.com", "password": "WrongPass1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validate_session_endpoint() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/validate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["valid"], false);

    let response = app
        .clone()
        .oneshot(bearer_get("/api/auth/validate", "bogus-token"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["valid"], false);

    register(&app, "dave@example.com", "Sup3rSecret").await;
    let token = login(&app, "dave@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(bearer_get("/api/auth/validate", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["valid"], true);
    assert!(body["data"]["user_id"].is_i64());
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = spawn_app().await;

    register(&app, "erin@example.com", "Sup3rSecret").await;
    let token = login(&app, "erin@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(bearer_post(
            "/api/auth/logout",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(bearer_get("/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_free_tier_feature_gating() {
    let app = spawn_app().await;

    register(&app, "frank@example.com", "Sup3rSecret").await;
    let token = login(&app, "frank@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(bearer_get("/api/insights/reports/advanced", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["upgrade_url"].is_string());

    let response = app
        .clone()
        .oneshot(bearer_post(
            "/api/insights/alerts",
            &token,
            serde_json::json!({ "symbol": "VTI", "threshold": 250.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_analysis_quota_exhaustion() {
    let app = spawn_app().await;

    register(&app, "grace@example.com", "Sup3rSecret").await;
    let token = login(&app, "grace@example.com", "Sup3rSecret").await;

    // Free tier allows 5 analyses per day.
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(bearer_post(
                "/api/insights/analyses",
                &token,
                serde_json::json!({ "symbols": ["VTI"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(bearer_post(
            "/api/insights/analyses",
            &token,
            serde_json::json!({ "symbols": ["VTI"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert!(body["upgrade_url"].is_string());

    let response = app
        .clone()
        .oneshot(bearer_get("/api/account/usage", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let analysis = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["kind"] == "analysis")
        .unwrap();
    assert_eq!(analysis["used_today"], 5);
    assert_eq!(analysis["limit"], 5);
}

#[tokio::test]
async fn test_account_tier_endpoint() {
    let app = spawn_app().await;

    register(&app, "heidi@example.com", "Sup3rSecret").await;
    let token = login(&app, "heidi@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(bearer_get("/api/account/tier", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["tier"], "free");
    let features = body["data"]["features"].as_array().unwrap();
    assert!(features.contains(&serde_json::json!("portfolio_analysis")));
    assert!(!features.contains(&serde_json::json!("advanced_reports")));
}

#[tokio::test]
async fn test_change_password_revokes_session() {
    let app = spawn_app().await;

    register(&app, "ivan@example.com", "Sup3rSecret").await;
    let token = login(&app, "ivan@example.com", "Sup3rSecret").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/password")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "current_password": "Sup3rSecret",
                        "new_password": "N3wSecret!"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old session is gone; the new password works.
    let response = app
        .clone()
        .oneshot(bearer_get("/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let _ = login(&app, "ivan@example.com", "N3wSecret!").await;
}
