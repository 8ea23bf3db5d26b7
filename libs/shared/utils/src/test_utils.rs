use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{TokenPair, UserProfile, UserType};

use crate::session::Session;
use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-signing-must-be-long-enough".to_string(),
            api_url: "http://localhost:8000".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock backend (`MockServer::uri()`).
    pub fn with_backend(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_url: self.api_url.clone(),
            save_notice_seconds: 1,
            request_timeout_seconds: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        AppState::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub user_type: UserType,
}

impl TestUser {
    pub fn new(username: &str, user_type: UserType) -> Self {
        Self {
            id: (Uuid::new_v4().as_u128() % 100_000) as i64 + 1,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            user_type,
        }
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, UserType::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, UserType::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, UserType::Admin)
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            fullname: None,
            email: self.email.clone(),
            phone_number: None,
            user_type: self.user_type,
            profile: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        MockBackendResponses::user_profile(self)
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// HS256 token with the claim set the backend issues for access tokens.
    pub fn create_access_token(user: &TestUser, secret: &str, exp_minutes: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::minutes(exp_minutes.unwrap_or(5));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "token_type": "access",
            "exp": exp.timestamp(),
            "iat": now.timestamp(),
            "jti": Uuid::new_v4().simple().to_string(),
            "user_id": user.id
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_access_token(user, secret, Some(-1))
    }

    pub fn create_token_pair(user: &TestUser, secret: &str) -> TokenPair {
        TokenPair {
            access: Self::create_access_token(user, secret, None),
            refresh: format!("refresh-{}", Uuid::new_v4().simple()),
        }
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Opens a session for `user` directly in the store, bypassing the sign-in flow.
pub async fn signed_in(state: &AppState, user: &TestUser) -> Arc<Session> {
    let tokens = JwtTestUtils::create_token_pair(user, &TestConfig::default().jwt_secret);
    state.sessions.create(user.to_profile(), tokens).await
}

pub fn bearer(session: &Session) -> String {
    format!("Bearer {}", session.id)
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn user_profile(user: &TestUser) -> serde_json::Value {
        json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "phone_number": null,
            "user_type": user.user_type,
            "profile": null
        })
    }

    pub fn token_pair(access: &str, refresh: &str) -> serde_json::Value {
        json!({
            "access": access,
            "refresh": refresh
        })
    }

    pub fn appointment(id: i64, status: &str, timeslot: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patient": 11,
            "patient_name": "Nguyen Van A",
            "doctor": 21,
            "doctor_name": "Tran Thi B",
            "timeslot": timeslot,
            "reason": "Annual check-up",
            "status": status,
            "created_at": "2025-01-01T08:00:00Z",
            "updated_at": "2025-01-01T08:00:00Z"
        })
    }

    pub fn doctor_listing(id: i64, username: &str, specialty: &str, address: &str) -> serde_json::Value {
        json!({
            "id": id,
            "username": username,
            "email": format!("{}@clinic.example", username),
            "phone_number": null,
            "doctor_profile_id": id + 100,
            "profile": {
                "specialty": specialty,
                "address": address,
                "license_number": "LIC-001"
            }
        })
    }

    pub fn medical_record(id: i64, diagnosis: &str, doctor_name: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "appointment": id + 500,
            "doctor_name": doctor_name,
            "diagnosis": diagnosis,
            "prescription": "Rest and fluids",
            "notes": "",
            "status": status,
            "created_at": "2025-02-01T09:00:00Z"
        })
    }

    pub fn error_response(detail: &str) -> serde_json::Value {
        json!({
            "detail": detail
        })
    }
}
