use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::models::Appointment;
use shared_models::error::AppError;

// ==============================================================================
// WEEKLY AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    #[serde(alias = "monday")]
    Monday,
    #[serde(alias = "tuesday")]
    Tuesday,
    #[serde(alias = "wednesday")]
    Wednesday,
    #[serde(alias = "thursday")]
    Thursday,
    #[serde(alias = "friday")]
    Friday,
    #[serde(alias = "saturday")]
    Saturday,
    #[serde(alias = "sunday")]
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One working shift, as typed into the form: "HH:MM" bounds and an
/// optional "HH:MM-HH:MM" break.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub break_time: Option<String>,
}

impl TimeSlot {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            break_time: None,
        }
    }

    pub fn with_break(mut self, break_time: &str) -> Self {
        self.break_time = Some(break_time.to_string());
        self
    }

    /// The slot a freshly added row starts with.
    pub fn default_shift() -> Self {
        Self {
            start: "08:00".to_string(),
            end: "12:00".to_string(),
            break_time: Some(String::new()),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.start.is_empty() && !self.end.is_empty()
    }

    pub fn break_str(&self) -> Option<&str> {
        self.break_time.as_deref().filter(|b| !b.is_empty())
    }

    pub fn with_field(&self, field: SlotField, value: &str) -> Self {
        let mut slot = self.clone();
        match field {
            SlotField::Start => slot.start = value.to_string(),
            SlotField::End => slot.end = value.to_string(),
            SlotField::BreakTime => slot.break_time = Some(value.to_string()),
        }
        slot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotField {
    Start,
    End,
    BreakTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub label: DayOfWeek,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

impl DaySchedule {
    pub fn empty(label: DayOfWeek) -> Self {
        Self { label, slots: Vec::new() }
    }
}

/// The seven-day configuration of one doctor. Every day is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WeekScheduleRepr", into = "WeekScheduleRepr")]
pub struct WeekSchedule {
    days: [DaySchedule; 7],
}

impl WeekSchedule {
    /// All seven days, no shifts.
    pub fn empty() -> Self {
        Self {
            days: DayOfWeek::ALL.map(DaySchedule::empty),
        }
    }

    pub fn day(&self, day: DayOfWeek) -> &DaySchedule {
        &self.days[day.index()]
    }

    pub(crate) fn day_mut(&mut self, day: DayOfWeek) -> &mut DaySchedule {
        &mut self.days[day.index()]
    }

    pub fn days(&self) -> impl Iterator<Item = &DaySchedule> {
        self.days.iter()
    }

    pub fn with_slots(mut self, day: DayOfWeek, slots: Vec<TimeSlot>) -> Self {
        self.day_mut(day).slots = slots;
        self
    }
}

impl Default for WeekSchedule {
    /// The seed shown when the availability page opens: a Monday morning shift.
    fn default() -> Self {
        Self::empty().with_slots(DayOfWeek::Monday, vec![TimeSlot::default_shift()])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeekScheduleRepr {
    days: Vec<DaySchedule>,
}

impl TryFrom<WeekScheduleRepr> for WeekSchedule {
    type Error = ScheduleError;

    fn try_from(repr: WeekScheduleRepr) -> Result<Self, Self::Error> {
        let mut seen = [false; 7];
        let mut week = WeekSchedule::empty();

        for day in repr.days {
            let index = day.label.index();
            if seen[index] {
                return Err(ScheduleError::DuplicateDay(day.label));
            }
            seen[index] = true;
            week.days[index] = day;
        }

        Ok(week)
    }
}

impl From<WeekSchedule> for WeekScheduleRepr {
    fn from(week: WeekSchedule) -> Self {
        Self {
            days: week.days.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Format,
    Ordering,
    Overlap,
    BreakFormat,
    Containment,
    Incomplete,
}

impl ValidationKind {
    pub fn message(self) -> &'static str {
        match self {
            ValidationKind::Format => "invalid time format",
            ValidationKind::Ordering => "start must precede end",
            ValidationKind::Overlap => "shift overlaps another shift",
            ValidationKind::BreakFormat => "invalid break time format",
            ValidationKind::Containment => "break time must fall within the shift",
            ValidationKind::Incomplete => "incomplete shift",
        }
    }
}

/// A problem with one slot, shown inline next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<DayOfWeek>,
    pub slot_index: usize,
    pub kind: ValidationKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(slot_index: usize, kind: ValidationKind) -> Self {
        Self {
            day: None,
            slot_index,
            kind,
            message: kind.message().to_string(),
        }
    }

    pub fn on(mut self, day: DayOfWeek) -> Self {
        self.day = Some(day);
        self
    }
}

/// Result of parsing a "HH:MM-HH:MM" break window, in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakWindow {
    pub valid: bool,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub total_hours: f64,
    pub working_days: usize,
    pub unused_hours: f64,
    pub slots_per_day: Vec<(DayOfWeek, usize)>,
}

// ==============================================================================
// SCHEDULE EDITING
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleAction {
    SetStart { day: DayOfWeek, index: usize, value: String },
    SetEnd { day: DayOfWeek, index: usize, value: String },
    SetBreak { day: DayOfWeek, index: usize, value: String },
    AddSlot { day: DayOfWeek },
    RemoveSlot { day: DayOfWeek, index: usize },
}

impl ScheduleAction {
    pub fn day(&self) -> DayOfWeek {
        match self {
            ScheduleAction::SetStart { day, .. }
            | ScheduleAction::SetEnd { day, .. }
            | ScheduleAction::SetBreak { day, .. }
            | ScheduleAction::AddSlot { day }
            | ScheduleAction::RemoveSlot { day, .. } => *day,
        }
    }

    /// The field edit carried by Set* actions.
    pub fn field_edit(&self) -> Option<(usize, SlotField, &str)> {
        match self {
            ScheduleAction::SetStart { index, value, .. } => Some((*index, SlotField::Start, value)),
            ScheduleAction::SetEnd { index, value, .. } => Some((*index, SlotField::End, value)),
            ScheduleAction::SetBreak { index, value, .. } => Some((*index, SlotField::BreakTime, value)),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{day} has no slot at index {index}")]
    SlotOutOfRange { day: DayOfWeek, index: usize },

    #[error("{0} appears more than once in the schedule")]
    DuplicateDay(DayOfWeek),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Nothing to undo")]
    NothingToUndo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Validating,
    Saving,
    Success { saved_at: DateTime<Utc> },
    Error { failure: SaveFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SaveFailure {
    /// The full-week gate found problems; nothing was sent.
    Validation { error_count: usize },
    /// The backend refused or could not be reached; edits are kept.
    Persistence { message: String },
}

/// What the availability page renders.
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub week: WeekSchedule,
    pub errors: Vec<ValidationError>,
    pub status: SaveStatus,
    pub summary: WeekSummary,
    pub can_save: bool,
    pub can_undo: bool,
}

// ==============================================================================
// DOCTOR PROFILE & DASHBOARD
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DoctorProfile {
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub specialty: String,
    pub address: String,
    pub license_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub profile: DoctorProfile,
    pub total_appointments: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub today: usize,
    pub next_appointment: Option<Appointment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorAgenda {
    pub date: NaiveDate,
    pub appointments: Vec<Appointment>,
    pub booked_dates: Vec<NaiveDate>,
}

impl From<ScheduleError> for AppError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::SlotOutOfRange { .. } | ScheduleError::DuplicateDay(_) => AppError::BadRequest(e.to_string()),
            ScheduleError::SaveInProgress | ScheduleError::NothingToUndo => AppError::Conflict(e.to_string()),
        }
    }
}
