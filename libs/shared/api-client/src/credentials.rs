use tokio::sync::{RwLock, RwLockWriteGuard};

use shared_models::auth::TokenPair;

/// The token pair of one signed-in session.
///
/// Reads are concurrent; a refresh takes the write half so two requests that
/// both see a `401` do not both spend the refresh token.
#[derive(Debug)]
pub struct Credentials {
    tokens: RwLock<TokenPair>,
}

impl Credentials {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }

    pub async fn access_token(&self) -> String {
        self.tokens.read().await.access.clone()
    }

    pub async fn snapshot(&self) -> TokenPair {
        self.tokens.read().await.clone()
    }

    pub async fn replace(&self, tokens: TokenPair) {
        *self.tokens.write().await = tokens;
    }

    pub(crate) async fn lock_for_refresh(&self) -> RwLockWriteGuard<'_, TokenPair> {
        self.tokens.write().await
    }
}
