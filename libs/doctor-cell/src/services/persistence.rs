use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_api_client::{ApiClient, Credentials};

use crate::models::WeekSchedule;

const AVAILABILITY_PATH: &str = "doctors/availability/";

/// Where a validated week goes. The backend contract is opaque to the
/// validator: it only needs to accept a serialized `WeekSchedule`.
#[async_trait]
pub trait SchedulePersistence: Send + Sync {
    async fn save_week(&self, week: &WeekSchedule, credentials: &Credentials) -> Result<()>;

    /// The stored week, or `None` when the doctor never saved one.
    async fn load_week(&self, credentials: &Credentials) -> Result<Option<WeekSchedule>>;
}

pub struct RestSchedulePersistence {
    api: ApiClient,
}

impl RestSchedulePersistence {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SchedulePersistence for RestSchedulePersistence {
    async fn save_week(&self, week: &WeekSchedule, credentials: &Credentials) -> Result<()> {
        debug!("Persisting weekly availability");

        let _: Value = self
            .api
            .request(credentials, Method::PUT, AVAILABILITY_PATH, Some(json!(week)))
            .await?;

        Ok(())
    }

    async fn load_week(&self, credentials: &Credentials) -> Result<Option<WeekSchedule>> {
        debug!("Loading stored weekly availability");

        let stored: Value = self
            .api
            .request(credentials, Method::GET, AVAILABILITY_PATH, None)
            .await?;

        if stored.is_null() || stored.get("days").is_none() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_value(stored)?))
    }
}
