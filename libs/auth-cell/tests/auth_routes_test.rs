use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use shared_utils::test_utils::{bearer, signed_in, JwtTestUtils, MockBackendResponses, TestConfig, TestUser};
use shared_utils::AppState;

fn setup(server: &MockServer) -> (Router, Arc<AppState>) {
    let state = TestConfig::with_backend(&server.uri()).to_state();
    (auth_routes(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, auth: Option<String>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn mount_login(server: &MockServer, user: &TestUser) {
    let tokens = JwtTestUtils::create_token_pair(user, &TestConfig::default().jwt_secret);

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .and(body_json(json!({"username": user.username, "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockBackendResponses::token_pair(&tokens.access, &tokens.refresh)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .and(header("authorization", format!("Bearer {}", tokens.access)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user.to_json()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_opens_session() {
    let server = MockServer::start().await;
    let (app, state) = setup(&server);
    let user = TestUser::doctor("doc");
    mount_login(&server, &user).await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "doc", "password": "secret"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"], "/doctor/dashboard");
    assert_eq!(body["user"]["username"], "doc");

    let session_id: Uuid = body["session_id"].as_str().unwrap().parse().unwrap();
    assert!(state.sessions.contains(&session_id).await);

    let (status, body) = send(&app, "GET", "/me", Some(format!("Bearer {}", session_id)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_type"], "doctor");
    assert_eq!(body["display_name"], "doc");
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let server = MockServer::start().await;
    let (app, state) = setup(&server);

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(MockBackendResponses::error_response("No active account found with the given credentials")),
        )
        .mount(&server)
        .await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "ghost", "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Login failed");
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_register_then_sign_in() {
    let server = MockServer::start().await;
    let (app, _) = setup(&server);
    let user = TestUser::patient("newbie");
    mount_login(&server, &user).await;

    Mock::given(method("POST"))
        .and(path("/api/users/register/"))
        .and(body_json(json!({
            "username": "newbie",
            "email": "newbie@example.com",
            "password": "secret",
            "user_type": "patient"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "username": "newbie",
            "email": "newbie@example.com",
            "user_type": "patient"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": "newbie",
            "email": "newbie@example.com",
            "password": "secret",
            "user_type": "patient"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"], "/patient/dashboard");
}

#[tokio::test]
async fn test_register_rejected_by_backend() {
    let server = MockServer::start().await;
    let (app, _) = setup(&server);

    Mock::given(method("POST"))
        .and(path("/api/users/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"username": ["already exists"]})))
        .mount(&server)
        .await;

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": "taken",
            "email": "taken@example.com",
            "password": "secret",
            "user_type": "doctor"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Registration failed");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = MockServer::start().await;
    let (app, state) = setup(&server);
    let session = signed_in(&state, &TestUser::patient("pat")).await;

    let (status, body) = send(&app, "POST", "/logout", Some(bearer(&session)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_open"], true);

    let (status, _) = send(&app, "GET", "/me", Some(bearer(&session)), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/logout", Some(bearer(&session)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_open"], false);
}

#[tokio::test]
async fn test_refresh_profile_updates_cached_user() {
    let server = MockServer::start().await;
    let (app, state) = setup(&server);
    let user = TestUser::patient("pat");
    let session = signed_in(&state, &user).await;

    let mut fresh = user.to_json();
    fresh["fullname"] = json!("Pham Thi D");

    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fresh))
        .mount(&server)
        .await;

    let (status, _) = send(&app, "POST", "/refresh-profile", Some(bearer(&session)), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session.user().await.display_name(), "Pham Thi D");
}

#[tokio::test]
async fn test_change_password_mismatch_stays_local() {
    let server = MockServer::start().await;
    let (app, state) = setup(&server);
    let session = signed_in(&state, &TestUser::doctor("doc")).await;

    Mock::given(method("POST"))
        .and(path("/api/users/changepassword/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        &app,
        "POST",
        "/change-password",
        Some(bearer(&session)),
        Some(json!({"old_password": "a", "new_password": "b", "confirm_password": "c"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "New passwords do not match");
}

#[tokio::test]
async fn test_change_password_forwards_to_backend() {
    let server = MockServer::start().await;
    let (app, state) = setup(&server);
    let session = signed_in(&state, &TestUser::doctor("doc")).await;

    Mock::given(method("POST"))
        .and(path("/api/users/changepassword/"))
        .and(body_json(json!({"old_password": "old-secret", "new_password": "new-secret"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        &app,
        "POST",
        "/change-password",
        Some(bearer(&session)),
        Some(json!({
            "old_password": "old-secret",
            "new_password": "new-secret",
            "confirm_password": "new-secret"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed");
}
