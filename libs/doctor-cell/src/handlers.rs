use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_api_client::app_error;
use shared_models::auth::UserType;
use shared_models::error::AppError;
use shared_utils::{AppState, Session};

use crate::models::{EditorView, ScheduleAction, UpdateDoctorProfileRequest, WeekSchedule};
use crate::services::schedule::SharedEditor;
use crate::services::{
    save_editor, DoctorService, RestSchedulePersistence, ScheduleEditor, ScheduleEditorStore,
    SchedulePersistence,
};

/// State of the doctor routes: the shared app state plus the per-session
/// availability editors.
#[derive(Clone)]
pub struct DoctorState {
    pub app: Arc<AppState>,
    pub editors: ScheduleEditorStore,
    pub persistence: Arc<dyn SchedulePersistence>,
}

impl DoctorState {
    pub fn new(app: Arc<AppState>) -> Arc<Self> {
        let persistence = Arc::new(RestSchedulePersistence::new(app.api.clone()));
        Self::with_persistence(app, persistence)
    }

    pub fn with_persistence(app: Arc<AppState>, persistence: Arc<dyn SchedulePersistence>) -> Arc<Self> {
        Arc::new(Self {
            app,
            editors: ScheduleEditorStore::new(),
            persistence,
        })
    }

    fn new_editor(&self, week: WeekSchedule) -> ScheduleEditor {
        ScheduleEditor::new(week, self.app.config.save_notice_seconds)
    }

    async fn editor_for(&self, session: &Session) -> SharedEditor {
        self.editors
            .get_or_insert_with(session.id, || self.new_editor(WeekSchedule::default()))
            .await
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub reload: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgendaQuery {
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// WEEKLY AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<EditorView>, AppError> {
    session.require_role(UserType::Doctor)?;

    if query.reload.unwrap_or(false) {
        debug!("Reloading stored availability for session {}", session.id);

        let week = state
            .persistence
            .load_week(&session.credentials)
            .await
            .map_err(app_error)?
            .unwrap_or_default();

        let editor = state.editors.insert(session.id, state.new_editor(week)).await;
        let view = editor.lock().await.view();
        return Ok(Json(view));
    }

    let editor = state.editor_for(&session).await;
    let view = editor.lock().await.view();
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn dispatch_action(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
    Json(action): Json<ScheduleAction>,
) -> Result<Json<EditorView>, AppError> {
    session.require_role(UserType::Doctor)?;

    let editor = state.editor_for(&session).await;
    let mut editor = editor.lock().await;
    editor.dispatch(&action)?;

    Ok(Json(editor.view()))
}

#[axum::debug_handler]
pub async fn validate_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<EditorView>, AppError> {
    session.require_role(UserType::Doctor)?;

    let editor = state.editor_for(&session).await;
    let mut editor = editor.lock().await;
    editor.validate();

    Ok(Json(editor.view()))
}

#[axum::debug_handler]
pub async fn undo_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<EditorView>, AppError> {
    session.require_role(UserType::Doctor)?;

    let editor = state.editor_for(&session).await;
    let mut editor = editor.lock().await;
    editor.undo()?;

    Ok(Json(editor.view()))
}

#[axum::debug_handler]
pub async fn dismiss_status(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<EditorView>, AppError> {
    session.require_role(UserType::Doctor)?;

    let editor = state.editor_for(&session).await;
    let mut editor = editor.lock().await;
    editor.dismiss_status();

    Ok(Json(editor.view()))
}

#[axum::debug_handler]
pub async fn save_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<EditorView>, AppError> {
    session.require_role(UserType::Doctor)?;

    let editor = state.editor_for(&session).await;
    let view = save_editor(&editor, state.persistence.as_ref(), &session.credentials).await?;

    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn discard_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<StatusCode, AppError> {
    session.require_role(UserType::Doctor)?;

    if !state.editors.remove(&session.id).await {
        warn!("No availability editor to discard for session {}", session.id);
    }

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// PROFILE, DASHBOARD & AGENDA
// ==============================================================================

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    let doctor_service = DoctorService::new(&state.app.api);
    let profile = doctor_service
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
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    if request.fullname.trim().is_empty() || request.email.trim().is_empty() {
        return Err(AppError::ValidationError("Full name and email are required".to_string()));
    }

    let doctor_service = DoctorService::new(&state.app.api);

    let mut user = session.user().await;
    user.fullname = Some(request.fullname.clone());
    user.email = request.email.clone();
    user.phone_number = Some(request.phone_number.clone());

    let profile = doctor_service
        .update_profile(request, &session.credentials)
        .await
        .map_err(app_error)?;

    session.set_user(user.clone()).await;

    Ok(Json(json!({
        "user": user,
        "profile": profile,
        "message": "Profile updated"
    })))
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    let doctor_service = DoctorService::new(&state.app.api);
    let dashboard = doctor_service.dashboard(&session.credentials).await?;

    Ok(Json(json!(dashboard)))
}

#[axum::debug_handler]
pub async fn get_agenda(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<Value>, AppError> {
    session.require_role(UserType::Doctor)?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let doctor_service = DoctorService::new(&state.app.api);
    let agenda = doctor_service.agenda(date, &session.credentials).await?;

    Ok(Json(json!(agenda)))
}
