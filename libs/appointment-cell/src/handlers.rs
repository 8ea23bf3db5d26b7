use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::UserType;
use shared_models::error::AppError;
use shared_utils::{AppState, Session};

use crate::models::{AppointmentQuery, BookAppointmentRequest, UpdateAppointmentRequest};
use crate::services::{AppointmentBookingService, AppointmentConfirmationService};

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let booking_service = AppointmentBookingService::new(&state.api);
    let appointment = booking_service
        .book_appointment(request, &session.credentials)
        .await?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment request sent, waiting for the doctor to confirm"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let booking_service = AppointmentBookingService::new(&state.api);
    let appointments = booking_service
        .list_appointments(query.status, &session.credentials)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn grouped_appointments(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let booking_service = AppointmentBookingService::new(&state.api);
    let groups = booking_service.grouped_appointments(&session.credentials).await?;

    Ok(Json(json!(groups)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let booking_service = AppointmentBookingService::new(&state.api);
    let appointment = booking_service
        .get_appointment(appointment_id, &session.credentials)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let booking_service = AppointmentBookingService::new(&state.api);
    let appointment = booking_service
        .update_appointment(appointment_id, request, &session.credentials)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let booking_service = AppointmentBookingService::new(&state.api);
    let appointment = booking_service
        .cancel_appointment(appointment_id, &session.credentials)
        .await?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_appointments(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    let confirmation_service = AppointmentConfirmationService::new(&state.api);
    let appointments = confirmation_service
        .doctor_appointments(&session.credentials)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    let confirmation_service = AppointmentConfirmationService::new(&state.api);
    let appointment = confirmation_service
        .confirm(appointment_id, &session.credentials)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn doctor_cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    let confirmation_service = AppointmentConfirmationService::new(&state.api);
    let appointment = confirmation_service
        .cancel(appointment_id, &session.credentials)
        .await?;

    Ok(Json(json!(appointment)))
}
