// libs/scheduling-cell/src/services/slots.rs
//
// Pure slot arithmetic: no I/O, no state. Everything here is a function of
// its inputs so the day view can be recomputed freely.
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::models::{BookedAppointment, DayOfWeek, DayStatus, SchedulingError, WeeklyAvailability};

pub const NO_WEEKLY_RULE_REASON: &str = "Not available on this day of the week";
pub const FALLBACK_UNAVAILABLE_REASON: &str = "This date is unavailable.";

/// Decide whether an organization is bookable on `date`.
///
/// A date-level blackout always wins over a matching weekly rule. With no
/// blackout, any weekly rule for the date's weekday makes the day available.
pub fn resolve_day_status(
    rules: &[WeeklyAvailability],
    overrides: &[crate::models::UnavailableDate],
    date: NaiveDate,
) -> DayStatus {
    if let Some(blackout) = overrides.iter().find(|entry| entry.date == date) {
        return DayStatus {
            available: false,
            reason: Some(
                blackout
                    .reason
                    .clone()
                    .unwrap_or_else(|| FALLBACK_UNAVAILABLE_REASON.to_string()),
            ),
        };
    }

    let weekday = DayOfWeek::from_weekday(date.weekday());
    if rules.iter().any(|rule| rule.day_of_week == weekday) {
        return DayStatus {
            available: true,
            reason: None,
        };
    }

    DayStatus {
        available: false,
        reason: Some(NO_WEEKLY_RULE_REASON.to_string()),
    }
}

/// Hourly slot start times for `date`, taken from the weekly rule matching
/// its weekday. The window is half-open: a 09:00-17:00 rule yields
/// 09:00..16:00 and never a slot starting at the end time itself.
pub fn generate_hour_slots(
    rules: &[WeeklyAvailability],
    date: NaiveDate,
) -> Result<Vec<NaiveTime>, SchedulingError> {
    let weekday = DayOfWeek::from_weekday(date.weekday());
    let rule = match rules.iter().find(|rule| rule.day_of_week == weekday) {
        Some(rule) => rule,
        None => return Ok(Vec::new()),
    };

    let start = rule.start()?;
    let end = rule.end()?;
    if start >= end {
        return Err(SchedulingError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(Duration::hours(1));
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    Ok(slots)
}

/// Appointments occupying the one-hour slot starting at `slot` on `date`.
///
/// An appointment occupies only the slot containing its start time; a
/// booking that runs past the hour boundary is not spread across slots.
pub fn appointments_in_slot<'a>(
    appointments: &'a [BookedAppointment],
    date: NaiveDate,
    slot: NaiveTime,
) -> Vec<&'a BookedAppointment> {
    let slot_start = date.and_time(slot).and_utc();
    let slot_end = slot_start + Duration::minutes(60);

    appointments
        .iter()
        .filter(|apt| apt.start_time >= slot_start && apt.start_time < slot_end)
        .collect()
}
