use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{
    BreakWindow, DayOfWeek, SlotField, TimeSlot, ValidationError, ValidationKind, WeekSchedule,
    WeekSummary,
};

// ASCII digits only; `\d` would also accept other scripts' digits.
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2})$").expect("time pattern compiles"));

static BREAK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2}:[0-9]{2})-([0-9]{2}:[0-9]{2})$").expect("break pattern compiles")
});

/// Hours a full-time week is measured against on the summary cards.
const REFERENCE_WEEK_HOURS: f64 = 7.0 * 8.0;

pub fn is_time_format(value: &str) -> bool {
    TIME_PATTERN.is_match(value)
}

/// Minutes since midnight of an "HH:MM" string.
///
/// Anything that is not exactly two digits, a colon and two digits counts as
/// `0` so half-typed form fields never fail. Digit ranges are not checked.
pub fn time_to_minutes(time: &str) -> u32 {
    let Some(captures) = TIME_PATTERN.captures(time) else {
        return 0;
    };

    let hours: u32 = captures[1].parse().unwrap_or(0);
    let minutes: u32 = captures[2].parse().unwrap_or(0);
    hours * 60 + minutes
}

/// Parses a "HH:MM-HH:MM" break. An absent or empty break is valid.
/// Does not look at the enclosing shift.
pub fn validate_break_time(break_time: Option<&str>) -> BreakWindow {
    let Some(raw) = break_time.filter(|b| !b.is_empty()) else {
        return BreakWindow { valid: true, start: 0, end: 0 };
    };

    let Some(captures) = BREAK_PATTERN.captures(raw) else {
        return BreakWindow { valid: false, start: 0, end: 0 };
    };

    let start = time_to_minutes(&captures[1]);
    let end = time_to_minutes(&captures[2]);
    BreakWindow { valid: start < end, start, end }
}

/// Whether `candidate` intersects any slot of `slots` other than the one at
/// `exclude_index`. Intervals are half-open, so a shift ending at 10:00 and
/// one starting at 10:00 do not overlap. Incomplete slots are ignored.
pub fn has_overlap(slots: &[TimeSlot], candidate: &TimeSlot, exclude_index: usize) -> bool {
    let new_start = time_to_minutes(&candidate.start);
    let new_end = time_to_minutes(&candidate.end);

    slots.iter().enumerate().any(|(index, slot)| {
        if index == exclude_index || !slot.is_complete() {
            return false;
        }
        let start = time_to_minutes(&slot.start);
        let end = time_to_minutes(&slot.end);
        new_start < end && new_end > start
    })
}

/// Validates one field edit against the rest of the day.
///
/// `day_slots` is the day before the edit; the slot at `index` is checked
/// with `field` set to `new_value`.
pub fn validate_slot(
    day_slots: &[TimeSlot],
    index: usize,
    field: SlotField,
    new_value: &str,
) -> Vec<ValidationError> {
    let Some(current) = day_slots.get(index) else {
        return Vec::new();
    };

    let mut updated_slots = day_slots.to_vec();
    updated_slots[index] = current.with_field(field, new_value);
    let slot = &updated_slots[index];

    let mut errors = Vec::new();

    if matches!(field, SlotField::Start | SlotField::End) && !is_time_format(new_value) {
        errors.push(ValidationError::new(index, ValidationKind::Format));
        return errors;
    }

    if slot.is_complete() {
        check_ordering_and_overlap(&updated_slots, index, &mut errors);
    }

    if field == SlotField::BreakTime && !new_value.is_empty() {
        check_break(slot, index, &mut errors);
    }

    errors
}

/// The gate run before a save: every slot of every day, Monday first.
/// Save is allowed only when this returns nothing.
pub fn validate_full_week(week: &WeekSchedule) -> Vec<ValidationError> {
    let mut all_errors = Vec::new();

    for day in week.days() {
        for (index, slot) in day.slots.iter().enumerate() {
            let mut errors = Vec::new();

            if !slot.is_complete() {
                errors.push(ValidationError::new(index, ValidationKind::Incomplete));
            } else if !is_time_format(&slot.start) || !is_time_format(&slot.end) {
                errors.push(ValidationError::new(index, ValidationKind::Format));
            } else {
                check_ordering_and_overlap(&day.slots, index, &mut errors);
                if slot.break_str().is_some() {
                    check_break(slot, index, &mut errors);
                }
            }

            all_errors.extend(errors.into_iter().map(|e| e.on(day.label)));
        }
    }

    debug!("Full-week validation found {} problems", all_errors.len());
    all_errors
}

fn check_ordering_and_overlap(slots: &[TimeSlot], index: usize, errors: &mut Vec<ValidationError>) {
    let slot = &slots[index];

    if time_to_minutes(&slot.start) >= time_to_minutes(&slot.end) {
        errors.push(ValidationError::new(index, ValidationKind::Ordering));
    }

    if has_overlap(slots, slot, index) {
        errors.push(ValidationError::new(index, ValidationKind::Overlap));
    }
}

fn check_break(slot: &TimeSlot, index: usize, errors: &mut Vec<ValidationError>) {
    let window = validate_break_time(slot.break_str());

    if !window.valid {
        errors.push(ValidationError::new(index, ValidationKind::BreakFormat));
        return;
    }

    if slot.is_complete() {
        let slot_start = time_to_minutes(&slot.start);
        let slot_end = time_to_minutes(&slot.end);
        // Inclusive: a break may start exactly at shift start or end at shift end.
        if window.start < slot_start || window.end > slot_end {
            errors.push(ValidationError::new(index, ValidationKind::Containment));
        }
    }
}

impl WeekSummary {
    pub fn of(week: &WeekSchedule) -> Self {
        let total_hours: f64 = week
            .days()
            .flat_map(|day| day.slots.iter())
            .filter(|slot| slot.is_complete())
            .map(|slot| {
                let start = time_to_minutes(&slot.start) as f64;
                let end = time_to_minutes(&slot.end) as f64;
                let mut hours = (end - start) / 60.0;

                let window = validate_break_time(slot.break_str());
                if window.valid && window.start != 0 && window.end != 0 {
                    hours -= (window.end - window.start) as f64 / 60.0;
                }

                hours.max(0.0)
            })
            .sum();

        let slots_per_day: Vec<(DayOfWeek, usize)> =
            week.days().map(|day| (day.label, day.slots.len())).collect();

        Self {
            total_hours,
            working_days: slots_per_day.iter().filter(|(_, count)| *count > 0).count(),
            unused_hours: REFERENCE_WEEK_HOURS - total_hours,
            slots_per_day,
        }
    }
}
