use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub port: u16,
    pub session_ttl_minutes: i64,
    pub save_notice_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            port: 3000,
            session_ttl_minutes: 720,
            save_notice_seconds: 3,
            request_timeout_seconds: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_url: env::var("API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("API_URL not set, using {}", defaults.api_url);
                    String::new()
                }),
            port: parse_or("PORTAL_PORT", defaults.port),
            session_ttl_minutes: parse_or("SESSION_TTL_MINUTES", defaults.session_ttl_minutes),
            save_notice_seconds: parse_or("SAVE_NOTICE_SECONDS", defaults.save_notice_seconds),
            request_timeout_seconds: parse_or("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - backend URL falls back to default");
            return Self {
                api_url: defaults.api_url,
                ..config
            };
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty()
    }

    /// Absolute URL of a backend REST path, e.g. `users/me/` -> `{api_url}/api/users/me/`.
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn parse_or<T: FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
