use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use shared_api_client::{ApiClient, Credentials};

use crate::models::{
    Appointment, AppointmentError, AppointmentGroups, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Patient side of the appointment flow.
pub struct AppointmentBookingService {
    api: ApiClient,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            api: api.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        credentials: &Credentials,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment with doctor {} at {}", request.doctor, request.timeslot);

        self.lifecycle.validate_booking(&request, Utc::now())?;

        let appointment: Appointment = self
            .api
            .request(credentials, Method::POST, "patients/booking/", Some(json!(request)))
            .await?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
        credentials: &Credentials,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing patient appointments, status filter: {:?}", status);

        let path = match status {
            Some(status) => format!("patients/appointments/?status={}", urlencoding::encode(status.as_str())),
            None => "patients/appointments/".to_string(),
        };

        let appointments: Vec<Appointment> = self.api.request(credentials, Method::GET, &path, None).await?;
        Ok(appointments)
    }

    pub async fn grouped_appointments(&self, credentials: &Credentials) -> Result<AppointmentGroups, AppointmentError> {
        let appointments = self.list_appointments(None, credentials).await?;
        Ok(self.lifecycle.group(appointments, Utc::now()))
    }

    pub async fn get_appointment(&self, appointment_id: i64, credentials: &Credentials) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("patients/appointments/{}/", appointment_id);
        let appointment: Option<Appointment> = self.api.request(credentials, Method::GET, &path, None).await?;

        appointment.ok_or(AppointmentError::NotFound)
    }

    pub async fn update_appointment(
        &self,
        appointment_id: i64,
        request: UpdateAppointmentRequest,
        credentials: &Credentials,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, credentials).await?;
        self.lifecycle.validate_update(&current, &request, Utc::now())?;

        let body = json!({
            "doctor": current.doctor,
            "timeslot": request.timeslot.unwrap_or(current.timeslot),
            "reason": request.reason.unwrap_or(current.reason),
        });

        let path = format!("patients/appointments/{}/", appointment_id);
        let updated: Appointment = self.api.request(credentials, Method::PUT, &path, Some(body)).await?;

        info!("Appointment {} updated", appointment_id);
        Ok(updated)
    }

    pub async fn cancel_appointment(&self, appointment_id: i64, credentials: &Credentials) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, credentials).await?;
        if current.status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }

        let body = json!({
            "doctor": current.doctor,
            "timeslot": current.timeslot,
            "reason": current.reason,
            "status": AppointmentStatus::Cancelled,
        });

        let path = format!("patients/appointments/{}/", appointment_id);
        let cancelled: Appointment = self.api.request(credentials, Method::PUT, &path, Some(body)).await?;

        info!("Appointment {} cancelled by patient", appointment_id);
        Ok(cancelled)
    }
}
