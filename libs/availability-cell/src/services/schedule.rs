use regex::Regex;

use crate::models::{AvailabilitySettings, AvailabilityError, UpdateAvailabilityRequest};

/// Two-digit 24-hour wall-clock time, e.g. "09:00" or "23:45".
const TIME_PATTERN: &str = r"^([01]\d|2[0-3]):([0-5]\d)$";

fn time_regex() -> Regex {
    Regex::new(TIME_PATTERN).unwrap()
}

/// Some(&str) only when the bound is present and non-empty; an empty string
/// means the break was cleared.
fn break_bound(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn parse_time_to_minutes(value: &str) -> Result<i32, AvailabilityError> {
    let invalid = || AvailabilityError::Validation(
        format!("'{}' must be in HH:mm format.", value)
    );

    let captures = time_regex().captures(value).ok_or_else(invalid)?;
    let hours: i32 = captures[1].parse().map_err(|_| invalid())?;
    let minutes: i32 = captures[2].parse().map_err(|_| invalid())?;

    Ok(hours * 60 + minutes)
}

/// "H:MM AM|PM". Hours 0 and 12 both render as "12"; minutes zero-padded.
pub fn format_minutes_to_12_hour(total_minutes: i32) -> String {
    let hours24 = total_minutes / 60;
    let minutes = total_minutes % 60;
    let period = if hours24 >= 12 { "PM" } else { "AM" };
    let hours12 = if hours24 % 12 == 0 { 12 } else { hours24 % 12 };
    format!("{}:{:02} {}", hours12, minutes, period)
}

/// Derive the ordered bookable time labels for a day from the settings.
///
/// A cursor walks from start_time in slot_duration_minutes steps; a slot is
/// emitted unless it overlaps the break window. A final slot that would run
/// past end_time is omitted. Pure and deterministic.
pub fn generate_slots(settings: &AvailabilitySettings) -> Result<Vec<String>, AvailabilityError> {
    let start = parse_time_to_minutes(&settings.start_time)?;
    let end = parse_time_to_minutes(&settings.end_time)?;

    let duration = settings.slot_duration_minutes;
    if duration < 15 {
        return Err(AvailabilityError::Validation(
            "slot_duration_minutes must be an integer >= 15.".to_string(),
        ));
    }

    // The break only applies when both bounds are set.
    let break_window = match (break_bound(&settings.break_start_time),
                              break_bound(&settings.break_end_time)) {
        (Some(break_start), Some(break_end)) => Some((
            parse_time_to_minutes(break_start)?,
            parse_time_to_minutes(break_end)?,
        )),
        _ => None,
    };

    let mut slots = Vec::new();
    let mut cursor = start;

    while cursor + duration <= end {
        let slot_end = cursor + duration;
        let in_break = break_window
            .map_or(false, |(break_start, break_end)| {
                !(slot_end <= break_start || cursor >= break_end)
            });

        if !in_break {
            slots.push(format_minutes_to_12_hour(cursor));
        }

        cursor += duration;
    }

    Ok(slots)
}

/// Validate an admin settings patch. Checks run in a fixed order and the
/// first failure wins. No cross-field validation is performed: start/end
/// ordering and break placement are intentionally unchecked.
pub fn validate_settings_patch(patch: &UpdateAvailabilityRequest) -> Result<(), AvailabilityError> {
    let time_fields = [
        ("start_time", &patch.start_time),
        ("end_time", &patch.end_time),
        ("break_start_time", &patch.break_start_time),
        ("break_end_time", &patch.break_end_time),
    ];

    let time_re = time_regex();
    for (field, value) in time_fields {
        if let Some(value) = value {
            if !value.is_empty() && !time_re.is_match(value) {
                return Err(AvailabilityError::Validation(
                    format!("{} must be in HH:mm format.", field),
                ));
            }
        }
    }

    if let Some(duration) = patch.slot_duration_minutes {
        if duration < 15 {
            return Err(AvailabilityError::Validation(
                "slot_duration_minutes must be an integer >= 15.".to_string(),
            ));
        }
    }

    if let Some(working_days) = &patch.working_days {
        let valid = working_days.iter().all(|day| (0..=6).contains(day));
        if !valid {
            return Err(AvailabilityError::Validation(
                "working_days must be an array with values between 0 and 6.".to_string(),
            ));
        }
    }

    Ok(())
}
