use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_api_client::Credentials;
use shared_utils::SessionStore;

use crate::models::{
    EditorView, SaveFailure, SaveStatus, ScheduleAction, ScheduleError, TimeSlot, ValidationError,
    WeekSchedule, WeekSummary,
};
use crate::services::availability::{validate_full_week, validate_slot};
use crate::services::persistence::SchedulePersistence;

const UNDO_DEPTH: usize = 50;

impl WeekSchedule {
    /// Returns the schedule with `action` applied. `self` is left untouched.
    pub fn apply(&self, action: &ScheduleAction) -> Result<WeekSchedule, ScheduleError> {
        let mut next = self.clone();
        let day = action.day();
        let slots = &mut next.day_mut(day).slots;

        match action {
            ScheduleAction::AddSlot { .. } => slots.push(TimeSlot::default_shift()),
            ScheduleAction::RemoveSlot { index, .. } => {
                if *index >= slots.len() {
                    return Err(ScheduleError::SlotOutOfRange { day, index: *index });
                }
                slots.remove(*index);
            }
            _ => {
                if let Some((index, field, value)) = action.field_edit() {
                    let slot = slots
                        .get_mut(index)
                        .ok_or(ScheduleError::SlotOutOfRange { day, index })?;
                    *slot = slot.with_field(field, value);
                }
            }
        }

        Ok(next)
    }
}

/// In-memory availability form of one session.
#[derive(Debug, Clone)]
pub struct ScheduleEditor {
    week: WeekSchedule,
    errors: Vec<ValidationError>,
    status: SaveStatus,
    history: VecDeque<WeekSchedule>,
    save_notice: Duration,
}

impl ScheduleEditor {
    pub fn new(week: WeekSchedule, save_notice_seconds: u64) -> Self {
        Self {
            week,
            errors: Vec::new(),
            status: SaveStatus::Idle,
            history: VecDeque::new(),
            save_notice: Duration::seconds(save_notice_seconds as i64),
        }
    }

    pub fn week(&self) -> &WeekSchedule {
        &self.week
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Current status; a success notice falls back to idle once it has been
    /// shown for the notice window.
    pub fn status(&self) -> SaveStatus {
        match &self.status {
            SaveStatus::Success { saved_at } if *saved_at + self.save_notice <= Utc::now() => SaveStatus::Idle,
            status => status.clone(),
        }
    }

    pub fn can_save(&self) -> bool {
        self.errors.is_empty() && self.status() != SaveStatus::Saving
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            week: self.week.clone(),
            errors: self.errors.clone(),
            status: self.status(),
            summary: WeekSummary::of(&self.week),
            can_save: self.can_save(),
            can_undo: !self.history.is_empty(),
        }
    }

    /// Applies one form action and recomputes the inline errors.
    ///
    /// Removing a slot only drops that slot's own errors. An overlap reported
    /// on a surviving sibling stays until the next validate or save, so
    /// `can_save` can remain false after the conflicting slot is gone.
    pub fn dispatch(&mut self, action: &ScheduleAction) -> Result<(), ScheduleError> {
        let day = action.day();

        let errors = match action.field_edit() {
            Some((index, field, value)) => validate_slot(&self.week.day(day).slots, index, field, value)
                .into_iter()
                .map(|e| e.on(day))
                .collect(),
            None => self.errors.clone(),
        };

        let next = self.week.apply(action)?;
        let previous = std::mem::replace(&mut self.week, next);
        self.push_history(previous);

        self.errors = match action {
            ScheduleAction::AddSlot { .. } => Vec::new(),
            ScheduleAction::RemoveSlot { index, .. } => errors
                .into_iter()
                .filter(|e| !(e.day == Some(day) && e.slot_index == *index))
                .map(|mut e| {
                    if e.day == Some(day) && e.slot_index > *index {
                        e.slot_index -= 1;
                    }
                    e
                })
                .collect(),
            _ => errors,
        };

        if matches!(self.status, SaveStatus::Error { .. }) {
            self.status = SaveStatus::Idle;
        }

        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), ScheduleError> {
        let previous = self.history.pop_back().ok_or(ScheduleError::NothingToUndo)?;
        self.week = previous;
        self.errors = validate_full_week(&self.week);
        Ok(())
    }

    /// Clears a success or failure banner.
    pub fn dismiss_status(&mut self) {
        if self.status != SaveStatus::Saving {
            self.status = SaveStatus::Idle;
        }
    }

    /// Runs the full-week gate. Errors replace the inline list.
    pub fn validate(&mut self) -> &[ValidationError] {
        self.errors = validate_full_week(&self.week);
        &self.errors
    }

    /// First half of a save: `idle -> validating -> saving`.
    ///
    /// Returns the snapshot to persist, or `None` when validation stopped the
    /// save (status is then `error` and the problems are in `errors`).
    pub fn begin_save(&mut self) -> Result<Option<WeekSchedule>, ScheduleError> {
        if self.status == SaveStatus::Saving {
            return Err(ScheduleError::SaveInProgress);
        }

        self.status = SaveStatus::Validating;
        self.errors = validate_full_week(&self.week);

        if !self.errors.is_empty() {
            debug!("Save blocked by {} validation problems", self.errors.len());
            self.status = SaveStatus::Error {
                failure: SaveFailure::Validation {
                    error_count: self.errors.len(),
                },
            };
            return Ok(None);
        }

        self.status = SaveStatus::Saving;
        Ok(Some(self.week.clone()))
    }

    /// Second half of a save: `saving -> success | error`. The schedule is
    /// never discarded, so a failed save can be retried as-is.
    pub fn finish_save(&mut self, outcome: anyhow::Result<()>) {
        self.status = match outcome {
            Ok(()) => {
                info!("Weekly availability saved");
                SaveStatus::Success { saved_at: Utc::now() }
            }
            Err(e) => {
                error!("Saving weekly availability failed: {}", e);
                SaveStatus::Error {
                    failure: SaveFailure::Persistence {
                        message: "save failed".to_string(),
                    },
                }
            }
        };
    }

    fn push_history(&mut self, week: WeekSchedule) {
        if self.history.len() == UNDO_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back(week);
    }
}

/// Runs a complete save against `persistence`.
///
/// The editor lock is released while the backend call is in flight, so the
/// form stays editable; edits made meanwhile are kept and go out with the
/// next save.
pub async fn save_editor(
    editor: &Mutex<ScheduleEditor>,
    persistence: &dyn SchedulePersistence,
    credentials: &Credentials,
) -> Result<EditorView, ScheduleError> {
    let snapshot = editor.lock().await.begin_save()?;

    if let Some(week) = snapshot {
        let outcome = persistence.save_week(&week, credentials).await;
        editor.lock().await.finish_save(outcome);
    }

    Ok(editor.lock().await.view())
}

pub type SharedEditor = Arc<Mutex<ScheduleEditor>>;

/// The availability editors of all sessions, keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct ScheduleEditorStore {
    editors: Arc<RwLock<HashMap<Uuid, SharedEditor>>>,
}

impl ScheduleEditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: &Uuid) -> Option<SharedEditor> {
        self.editors.read().await.get(session_id).cloned()
    }

    pub async fn get_or_insert_with<F>(&self, session_id: Uuid, create: F) -> SharedEditor
    where
        F: FnOnce() -> ScheduleEditor,
    {
        if let Some(editor) = self.get(&session_id).await {
            return editor;
        }

        self.editors
            .write()
            .await
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(create())))
            .clone()
    }

    pub async fn insert(&self, session_id: Uuid, editor: ScheduleEditor) -> SharedEditor {
        let shared = Arc::new(Mutex::new(editor));
        self.editors.write().await.insert(session_id, shared.clone());
        shared
    }

    pub async fn remove(&self, session_id: &Uuid) -> bool {
        self.editors.write().await.remove(session_id).is_some()
    }

    /// Drops editors whose session has ended.
    pub async fn retain_live(&self, sessions: &SessionStore) -> usize {
        let ids: Vec<Uuid> = self.editors.read().await.keys().copied().collect();

        let mut stale = Vec::new();
        for id in ids {
            if !sessions.contains(&id).await {
                stale.push(id);
            }
        }

        if !stale.is_empty() {
            let mut editors = self.editors.write().await;
            for id in &stale {
                editors.remove(id);
            }
            debug!("Dropped {} availability editors of closed sessions", stale.len());
        }

        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.editors.read().await.len()
    }
}
