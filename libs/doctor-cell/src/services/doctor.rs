use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use appointment_cell::models::{Appointment, AppointmentError, AppointmentStatus};
use appointment_cell::services::AppointmentConfirmationService;
use shared_api_client::{ApiClient, Credentials};

use crate::models::{DoctorAgenda, DoctorDashboard, DoctorProfile, UpdateDoctorProfileRequest};

const PROFILE_PATH: &str = "doctors/profile/";

pub struct DoctorService {
    api: ApiClient,
    appointments: AppointmentConfirmationService,
}

impl DoctorService {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            api: api.clone(),
            appointments: AppointmentConfirmationService::new(api),
        }
    }

    pub async fn get_profile(&self, credentials: &Credentials) -> anyhow::Result<DoctorProfile> {
        debug!("Fetching doctor profile");

        let profile: Option<DoctorProfile> = self.api.request(credentials, Method::GET, PROFILE_PATH, None).await?;
        Ok(profile.unwrap_or_default())
    }

    pub async fn update_profile(
        &self,
        request: UpdateDoctorProfileRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<DoctorProfile> {
        debug!("Updating doctor profile");

        let profile: DoctorProfile = self
            .api
            .request(credentials, Method::PUT, PROFILE_PATH, Some(json!(request)))
            .await?;

        info!("Doctor profile updated");
        Ok(profile)
    }

    pub async fn dashboard(&self, credentials: &Credentials) -> Result<DoctorDashboard, AppointmentError> {
        let (profile, appointments) = futures::try_join!(
            async { self.get_profile(credentials).await.map_err(AppointmentError::from) },
            self.appointments.doctor_appointments(credentials),
        )?;

        Ok(summarize(profile, &appointments, Utc::now()))
    }

    pub async fn agenda(&self, date: NaiveDate, credentials: &Credentials) -> Result<DoctorAgenda, AppointmentError> {
        let appointments = self.appointments.doctor_appointments(credentials).await?;
        Ok(agenda_for(date, appointments))
    }
}

/// Counts for the dashboard cards; cancelled visits never count as today's
/// or as the next one.
pub fn summarize(profile: DoctorProfile, appointments: &[Appointment], now: DateTime<Utc>) -> DoctorDashboard {
    let count = |status: AppointmentStatus| appointments.iter().filter(|a| a.status == status).count();
    let today = now.date_naive();

    let next_appointment = appointments
        .iter()
        .filter(|a| a.is_upcoming(now))
        .min_by_key(|a| a.timeslot)
        .cloned();

    DoctorDashboard {
        profile,
        total_appointments: appointments.len(),
        pending: count(AppointmentStatus::Pending),
        confirmed: count(AppointmentStatus::Confirmed),
        cancelled: count(AppointmentStatus::Cancelled),
        today: appointments
            .iter()
            .filter(|a| a.date() == today && a.status != AppointmentStatus::Cancelled)
            .count(),
        next_appointment,
    }
}

/// Appointments on `date` in time order, plus every date that has at least
/// one appointment for the calendar markers.
pub fn agenda_for(date: NaiveDate, appointments: Vec<Appointment>) -> DoctorAgenda {
    let mut booked_dates: Vec<NaiveDate> = appointments.iter().map(Appointment::date).collect();
    booked_dates.sort();
    booked_dates.dedup();

    let mut on_date: Vec<Appointment> = appointments.into_iter().filter(|a| a.date() == date).collect();
    on_date.sort_by_key(|a| a.timeslot);

    DoctorAgenda {
        date,
        appointments: on_date,
        booked_dates,
    }
}
