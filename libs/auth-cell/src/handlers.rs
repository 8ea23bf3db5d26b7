use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::HeaderMap,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_api_client::app_error;
use shared_models::auth::{ChangePasswordRequest, LoginRequest, RegisterRequest, TokenPair, UserProfile};
use shared_models::error::AppError;
use shared_utils::extractor::extract_session_id;
use shared_utils::{AppState, Session};

use crate::services::auth::{validate_password_change, validate_registration};
use crate::services::AuthService;

async fn open_session(state: &AppState, tokens: TokenPair, user: UserProfile) -> Value {
    let dashboard = user.dashboard_path();
    let session = state.sessions.create(user.clone(), tokens).await;

    json!({
        "session_id": session.id,
        "user": user,
        "dashboard": dashboard
    })
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Login attempt for {}", request.username);

    let auth_service = AuthService::new(&state.api);
    let (tokens, user) = auth_service.login(&request).await.map_err(|e| {
        warn!("Login failed for {}: {}", request.username, e);
        AppError::Auth("Login failed".to_string())
    })?;

    Ok(Json(open_session(&state, tokens, user).await))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    validate_registration(&request).map_err(AppError::ValidationError)?;

    let auth_service = AuthService::new(&state.api);
    auth_service.register(&request).await.map_err(|e| {
        warn!("Registration failed for {}: {}", request.username, e);
        AppError::BadRequest("Registration failed".to_string())
    })?;

    let login = LoginRequest {
        username: request.username.clone(),
        password: request.password.clone(),
    };
    let (tokens, user) = auth_service.login(&login).await.map_err(|e| {
        warn!("Sign-in after registration failed for {}: {}", request.username, e);
        AppError::Auth("Login failed".to_string())
    })?;

    Ok(Json(open_session(&state, tokens, user).await))
}

/// Ends the session named by the bearer header. Unknown sessions are fine.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let session_id = extract_session_id(&headers)?;
    let was_open = state.sessions.remove(&session_id).await.is_some();

    Ok(Json(json!({
        "signed_out": true,
        "was_open": was_open
    })))
}

pub async fn me(Extension(session): Extension<Arc<Session>>) -> Result<Json<Value>, AppError> {
    let user = session.user().await;

    Ok(Json(json!({
        "user": user,
        "display_name": user.display_name(),
        "dashboard": user.dashboard_path(),
        "signed_in_at": session.created_at()
    })))
}

pub async fn refresh_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    let auth_service = AuthService::new(&state.api);
    let user = auth_service
        .fetch_profile(&session.credentials)
        .await
        .map_err(app_error)?;

    session.set_user(user.clone()).await;

    Ok(Json(json!({ "user": user })))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    validate_password_change(&request).map_err(AppError::ValidationError)?;

    let auth_service = AuthService::new(&state.api);
    auth_service
        .change_password(&request, &session.credentials)
        .await
        .map_err(app_error)?;

    Ok(Json(json!({ "message": "Password changed" })))
}
