use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use shared_api_client::{ApiClient, Credentials};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Doctor side: the incoming queue and the confirm/cancel decisions.
pub struct AppointmentConfirmationService {
    api: ApiClient,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentConfirmationService {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            api: api.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn doctor_appointments(&self, credentials: &Credentials) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching doctor appointments");

        let mut appointments: Vec<Appointment> = self
            .api
            .request(credentials, Method::GET, "doctors/appointments/", None)
            .await?;

        appointments.sort_by_key(|a| a.timeslot);
        Ok(appointments)
    }

    pub async fn confirm(&self, appointment_id: i64, credentials: &Credentials) -> Result<Appointment, AppointmentError> {
        self.decide(appointment_id, AppointmentStatus::Confirmed, credentials).await
    }

    pub async fn cancel(&self, appointment_id: i64, credentials: &Credentials) -> Result<Appointment, AppointmentError> {
        self.decide(appointment_id, AppointmentStatus::Cancelled, credentials).await
    }

    async fn decide(
        &self,
        appointment_id: i64,
        next: AppointmentStatus,
        credentials: &Credentials,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .doctor_appointments(credentials)
            .await?
            .into_iter()
            .find(|a| a.id == appointment_id)
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle.validate_status_transition(appointment.status, next)?;

        let action = match next {
            AppointmentStatus::Confirmed => "confirm",
            _ => "cancel",
        };
        let path = format!("doctors/appointments/{}/{}/", appointment_id, action);

        let response: Value = self.api.request(credentials, Method::POST, &path, None).await?;

        // The backend answers with the appointment or with a bare status message.
        appointment = match serde_json::from_value::<Appointment>(response) {
            Ok(updated) => updated,
            Err(_) => Appointment { status: next, ..appointment },
        };

        info!("Appointment {} {}", appointment_id, appointment.status);
        Ok(appointment)
    }
}
