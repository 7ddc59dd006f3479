use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{BookingSettings, Visit, WorkingHours};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotRejection {
    #[error("Online booking is disabled for this organization")]
    BookingDisabled,

    #[error("Cannot book in the past")]
    InPast,

    #[error("Cannot book more than {advance_days} days in advance")]
    TooFarAhead { advance_days: i64 },

    #[error("Bookings must be made at least {min_advance_hours} hours in advance")]
    TooSoon { min_advance_hours: i64 },

    #[error("The organization is closed on this day")]
    ClosedDay,

    #[error("That time is outside working hours ({open}-{close})")]
    OutsideHours { open: String, close: String },
}

/// Decide whether `start` is a legal candidate slot. All times are the
/// organization's local wall clock.
pub fn validate_slot(
    start: &NaiveDateTime,
    settings: &BookingSettings,
    now: &NaiveDateTime,
) -> Result<(), SlotRejection> {
    if !settings.enabled {
        return Err(SlotRejection::BookingDisabled);
    }

    if *start < *now {
        return Err(SlotRejection::InPast);
    }

    // A horizon past the representable range never limits anything.
    let latest = Duration::try_days(settings.advance_days).and_then(|d| now.checked_add_signed(d));
    if latest.is_some_and(|latest| *start > latest) {
        return Err(SlotRejection::TooFarAhead {
            advance_days: settings.advance_days,
        });
    }

    // A lead time past the representable range can never be met.
    let earliest =
        Duration::try_hours(settings.min_advance_hours).and_then(|d| now.checked_add_signed(d));
    if !earliest.is_some_and(|earliest| *start >= earliest) {
        return Err(SlotRejection::TooSoon {
            min_advance_hours: settings.min_advance_hours,
        });
    }

    let Some(hours) = settings.working_hours.for_datetime(start) else {
        return Err(SlotRejection::ClosedDay);
    };

    if !hours.contains(start.time()) {
        return Err(SlotRejection::OutsideHours {
            open: hours.open.clone(),
            close: hours.close.clone(),
        });
    }

    Ok(())
}

/// Start times on `date`, every `step_minutes` from opening, that pass
/// validation and do not intersect any of `taken`.
pub fn free_slots(
    date: NaiveDate,
    duration_minutes: i32,
    step_minutes: i64,
    settings: &BookingSettings,
    now: &NaiveDateTime,
    taken: &[Visit],
) -> Vec<NaiveDateTime> {
    let weekday = WorkingHours::weekday_index(&date.and_time(chrono::NaiveTime::MIN));
    let Some(hours) = settings.working_hours.for_day(weekday) else {
        return vec![];
    };
    let (Some(open), Some(close)) = (hours.open_time(), hours.close_time()) else {
        return vec![];
    };

    let step = Duration::minutes(step_minutes.max(1));
    let length = Duration::minutes(duration_minutes as i64);
    let close_at = date.and_time(close);

    let mut slots = vec![];
    let mut candidate = date.and_time(open);
    while candidate < close_at {
        let end = candidate + length;
        let legal = validate_slot(&candidate, settings, now).is_ok();
        let free = !taken
            .iter()
            .any(|v| v.status.occupies_slot() && v.overlaps(&candidate, &end));
        if legal && free {
            slots.push(candidate);
        }
        candidate += step;
    }
    slots
}
