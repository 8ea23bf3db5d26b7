use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use shared_api_client::app_error;
use shared_models::auth::UserType;
use shared_models::error::AppError;
use shared_utils::{AppState, Session};

use crate::models::{DoctorSearchQuery, PatientProfile, RecordSearchQuery};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let service = PatientService::new(&state.api);
    let profile = service
        .get_profile(&session.credentials)
        .await
        .map_err(app_error)?;

    Ok(Json(json!({
        "user": session.user().await,
        "profile": profile
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Json(request): Json<PatientProfile>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    request
        .validate(Utc::now().date_naive())
        .map_err(AppError::ValidationError)?;

    let service = PatientService::new(&state.api);
    let profile = service
        .update_profile(request, &session.credentials)
        .await
        .map_err(app_error)?;

    if let Some(fullname) = &profile.fullname {
        let mut user = session.user().await;
        user.fullname = Some(fullname.clone());
        session.set_user(user).await;
    }

    Ok(Json(json!({
        "profile": profile,
        "message": "Profile updated"
    })))
}

#[axum::debug_handler]
pub async fn find_doctors(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let service = PatientService::new(&state.api);
    let doctors = service
        .find_doctors(&query, &session.credentials)
        .await
        .map_err(app_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let service = PatientService::new(&state.api);
    let dashboard = service
        .dashboard(&session.credentials)
        .await
        .map_err(app_error)?;

    Ok(Json(dashboard))
}

#[axum::debug_handler]
pub async fn medical_records(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(query): Query<RecordSearchQuery>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Patient)?;

    let service = PatientService::new(&state.api);
    let records = service
        .medical_records(&query, &session.credentials)
        .await
        .map_err(app_error)?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
    })))
}
