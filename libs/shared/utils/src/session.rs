use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_api_client::Credentials;
use shared_models::auth::{TokenPair, UserProfile, UserType};
use shared_models::error::AppError;

/// Context of one signed-in browser.
///
/// Created by sign-in, handed to handlers through request extensions, and
/// dropped at sign-out or when it has been idle longer than the store's TTL.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub user_type: UserType,
    pub credentials: Credentials,
    user: RwLock<UserProfile>,
    created_at: DateTime<Utc>,
    last_seen: AtomicI64,
}

impl Session {
    pub fn new(user: UserProfile, tokens: TokenPair) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_type: user.user_type,
            credentials: Credentials::new(tokens),
            user: RwLock::new(user),
            created_at: now,
            last_seen: AtomicI64::new(now.timestamp()),
        }
    }

    pub async fn user(&self) -> UserProfile {
        self.user.read().await.clone()
    }

    pub async fn set_user(&self, user: UserProfile) {
        *self.user.write().await = user;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.last_seen.load(Ordering::Relaxed), 0)
            .single()
            .unwrap_or(self.created_at)
    }

    fn touch(&self) {
        self.last_seen.store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen() + ttl < Utc::now()
    }

    pub fn require_role(&self, role: UserType) -> Result<(), AppError> {
        if self.user_type != role {
            return Err(AppError::Auth(format!("This action is available to {} accounts only", role)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub async fn create(&self, user: UserProfile, tokens: TokenPair) -> Arc<Session> {
        let session = Arc::new(Session::new(user, tokens));
        self.sessions.write().await.insert(session.id, session.clone());
        info!("Session {} opened for {} account", session.id, session.user_type);
        session
    }

    /// Looks a session up and marks it as used. Expired sessions are evicted
    /// on the spot and reported as missing.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(id).cloned()?;

        if session.is_expired(self.ttl) {
            debug!("Session {} expired", id);
            self.sessions.write().await.remove(id);
            return None;
        }

        session.touch();
        Some(session)
    }

    pub async fn contains(&self, id: &Uuid) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<Session>> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            info!("Session {} closed", id);
        }
        removed
    }

    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(ttl));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestUser;

    fn tokens() -> TokenPair {
        TokenPair {
            access: "access".to_string(),
            refresh: "refresh".to_string(),
        }
    }

    #[tokio::test]
    async fn create_get_remove() {
        let store = SessionStore::new(30);
        let session = store.create(TestUser::doctor("doc").to_profile(), tokens()).await;

        let found = store.get(&session.id).await.unwrap();
        assert_eq!(found.user_type, UserType::Doctor);
        assert_eq!(store.len().await, 1);

        assert!(store.remove(&session.id).await.is_some());
        assert!(store.get(&session.id).await.is_none());
        assert!(store.remove(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted() {
        let store = SessionStore::new(0);
        let session = store.create(TestUser::patient("pat").to_profile(), tokens()).await;
        session
            .last_seen
            .store(Utc::now().timestamp() - 120, Ordering::Relaxed);

        assert!(store.get(&session.id).await.is_none());
        assert!(!store.contains(&session.id).await);
    }

    #[tokio::test]
    async fn purge_only_drops_idle_sessions() {
        let store = SessionStore::new(10);
        let idle = store.create(TestUser::patient("idle").to_profile(), tokens()).await;
        let active = store.create(TestUser::patient("active").to_profile(), tokens()).await;
        idle.last_seen
            .store(Utc::now().timestamp() - 11 * 60, Ordering::Relaxed);

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.contains(&active.id).await);
        assert!(!store.contains(&idle.id).await);
    }

    #[test]
    fn role_guard() {
        let session = Session::new(TestUser::patient("pat").to_profile(), tokens());
        assert!(session.require_role(UserType::Patient).is_ok());
        assert!(matches!(session.require_role(UserType::Doctor), Err(AppError::Auth(_))));
    }
}
