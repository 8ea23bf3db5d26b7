use anyhow::Result;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_api_client::{ApiClient, Credentials};
use shared_models::auth::{ChangePasswordRequest, LoginRequest, RegisterRequest, TokenPair, UserProfile, UserType};

/// Talks to the backend's `users/` endpoints.
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: &ApiClient) -> Self {
        Self { api: api.clone() }
    }

    /// Exchanges credentials for a token pair and loads the matching profile.
    pub async fn login(&self, request: &LoginRequest) -> Result<(TokenPair, UserProfile)> {
        debug!("Signing in {}", request.username);

        let tokens: TokenPair = self
            .api
            .public_request(Method::POST, "users/login/", Some(json!(request)))
            .await?;

        let credentials = Credentials::new(tokens);
        let profile = self.fetch_profile(&credentials).await?;

        info!("User {} signed in as {}", profile.id, profile.user_type);
        Ok((credentials.snapshot().await, profile))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        debug!("Registering {} account {}", request.user_type, request.username);

        let _: Value = self
            .api
            .public_request(Method::POST, "users/register/", Some(json!(request)))
            .await?;

        Ok(())
    }

    pub async fn fetch_profile(&self, credentials: &Credentials) -> Result<UserProfile> {
        self.api.request(credentials, Method::GET, "users/me/", None).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest, credentials: &Credentials) -> Result<()> {
        debug!("Changing password");

        let body = json!({
            "old_password": request.old_password,
            "new_password": request.new_password,
        });

        let _: Value = self
            .api
            .request(credentials, Method::POST, "users/changepassword/", Some(body))
            .await?;

        Ok(())
    }
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), String> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err("Username and password are required".to_string());
    }

    if !request.email.contains('@') {
        return Err("A valid email address is required".to_string());
    }

    if request.user_type == UserType::Admin {
        warn!("Rejected self-registration of an admin account");
        return Err("Only doctor and patient accounts can be registered".to_string());
    }

    Ok(())
}

pub fn validate_password_change(request: &ChangePasswordRequest) -> Result<(), String> {
    if request.old_password.is_empty() || request.new_password.is_empty() {
        return Err("Please fill in every password field".to_string());
    }

    if request.new_password != request.confirm_password {
        return Err("New passwords do not match".to_string());
    }

    if request.new_password == request.old_password {
        return Err("New password must differ from the current one".to_string());
    }

    Ok(())
}
