use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{
    Appointment, AppointmentError, AppointmentGroups, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};

/// Local rules checked before anything is sent to the backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current, next);

        if !current.can_transition_to(next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(AppointmentError::InvalidStatusTransition { from: current, to: next });
        }

        Ok(())
    }

    pub fn validate_booking(
        &self,
        request: &BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Please describe the reason for the visit".to_string(),
            ));
        }

        if request.timeslot <= now {
            return Err(AppointmentError::InvalidTime(
                "Appointments must be booked in the future".to_string(),
            ));
        }

        Ok(())
    }

    /// Patients may edit anything that has not been cancelled.
    pub fn validate_update(
        &self,
        current: &Appointment,
        request: &UpdateAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if current.status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }

        if let Some(reason) = &request.reason {
            if reason.trim().is_empty() {
                return Err(AppointmentError::ValidationError("Reason cannot be empty".to_string()));
            }
        }

        if let Some(timeslot) = request.timeslot {
            if timeslot <= now {
                return Err(AppointmentError::InvalidTime(
                    "Appointments can only be moved to a future time".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Splits appointments into upcoming (soonest first), past and cancelled
    /// (both most recent first).
    pub fn group(&self, appointments: Vec<Appointment>, now: DateTime<Utc>) -> AppointmentGroups {
        let mut groups = AppointmentGroups::default();

        for appointment in appointments {
            if appointment.status == AppointmentStatus::Cancelled {
                groups.cancelled.push(appointment);
            } else if appointment.is_upcoming(now) {
                groups.upcoming.push(appointment);
            } else {
                groups.past.push(appointment);
            }
        }

        groups.upcoming.sort_by_key(|a| a.timeslot);
        groups.past.sort_by(|a, b| b.timeslot.cmp(&a.timeslot));
        groups.cancelled.sort_by(|a, b| b.timeslot.cmp(&a.timeslot));
        groups
    }
}
