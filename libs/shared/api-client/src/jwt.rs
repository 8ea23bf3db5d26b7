use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use tracing::debug;

use shared_models::auth::AccessClaims;

/// Reads the claims segment of a backend access token.
///
/// The portal never holds the signing key, so the signature is not checked
/// here; the backend remains the authority on validity. The claims are only
/// used to decide whether a refresh should happen before sending a request.
pub fn decode_claims(token: &str) -> Result<AccessClaims, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })
}

/// True when the token carries an `exp` claim that is at most `leeway_seconds` away.
/// Tokens that cannot be decoded are treated as not expired and left to the backend.
pub fn is_expired(token: &str, leeway_seconds: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => match claims.expires_at() {
            Some(expires_at) => expires_at <= Utc::now() + Duration::seconds(leeway_seconds),
            None => false,
        },
        Err(e) => {
            debug!("Access token not decodable ({}), skipping expiry check", e);
            false
        }
    }
}
