use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::session::Session;
use crate::state::AppState;

/// Reads the session id from `Authorization: Bearer <id>`.
pub fn extract_session_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    Uuid::parse_str(token.trim()).map_err(|_| AppError::Auth("Invalid session token".to_string()))
}

// Resolves the session and hands it to handlers as `Extension<Arc<Session>>`.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = extract_session_id(request.headers())?;

    let session = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| AppError::Auth("Session not found or expired".to_string()))?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

pub fn extract_session<B>(request: &Request<B>) -> Result<Arc<Session>, AppError> {
    request
        .extensions()
        .get::<Arc<Session>>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Session not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_id_from_bearer() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(&format!("Bearer {}", id)).unwrap());

        assert_eq!(extract_session_id(&headers).unwrap(), id);
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_session_id(&headers),
            Err(AppError::Auth(msg)) if msg == "Missing authorization header"
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert!(matches!(
            extract_session_id(&headers),
            Err(AppError::Auth(msg)) if msg == "Invalid authorization header format"
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer not-a-uuid"));
        assert!(matches!(
            extract_session_id(&headers),
            Err(AppError::Auth(msg)) if msg == "Invalid session token"
        ));
    }
}
