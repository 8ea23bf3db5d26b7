use std::sync::Arc;

use shared_api_client::ApiClient;
use shared_config::AppConfig;

use crate::session::SessionStore;

/// Everything a cell router needs: configuration, the live sessions and the
/// backend client. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub api: ApiClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let sessions = SessionStore::new(config.session_ttl_minutes);
        let api = ApiClient::new(&config);

        Arc::new(Self {
            config: Arc::new(config),
            sessions,
            api,
        })
    }
}
