//! Pure schedule evaluation: no I/O, no clock access beyond the `now`
//! passed in by the caller, so this is unit-tested deterministically.
//!
//! Grounded in spirit on `fourthplaces-mntogether`'s
//! `domains/schedules/models/schedule.rs` occurrence expansion, but
//! deliberately does not reuse its `rrule`-based machinery: the window
//! scan here is a fixed, explicit algorithm (daily start/end window over
//! a rolling 14-day horizon) rather than RFC 5545 recurrence expansion.

use chrono::{DateTime, Days, TimeZone, Utc};
use chrono_tz::Tz;

use super::models::ScheduleRules;

/// How many calendar days ahead the evaluator is willing to scan before
/// giving up and reporting no valid instant.
const HORIZON_DAYS: u64 = 14;

/// Returns the next UTC instant at or after `from_utc` that falls inside
/// one of `rules`' daily windows, evaluated in `tz`.
///
/// Returns `None` if no matching window exists within the next
/// [`HORIZON_DAYS`] days (e.g. `days` names a weekday that, combined
/// with a DST-adjacent `tz`, never resolves — callers should treat this
/// as "schedule currently unsatisfiable" rather than an error).
pub fn next_valid(rules: &ScheduleRules, tz: Tz, from_utc: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let from_local = from_utc.with_timezone(&tz);
    let from_date = from_local.date_naive();

    for i in 0..HORIZON_DAYS {
        let d = from_date.checked_add_days(Days::new(i))?;
        if !rules.contains_day(d.weekday()) {
            continue;
        }

        let window_start = local_datetime(tz, d, rules.start_time)?;
        let window_end = local_datetime(tz, d, rules.end_time)?;

        let candidate = if i == 0 {
            from_local
        } else {
            local_datetime(tz, d, chrono::NaiveTime::MIN)?
        };

        if candidate < window_start {
            return Some(window_start.with_timezone(&Utc));
        }
        if candidate <= window_end {
            return Some(candidate.with_timezone(&Utc));
        }
        // candidate > window_end: day's window already passed, keep scanning.
    }

    None
}

/// Resolves a naive local wall-clock instant to `tz`, preferring the
/// earlier of two instants on a DST-ambiguous fold and skipping the gap
/// entirely on a DST-nonexistent spring-forward (falls through to the
/// next iteration of the caller's day scan).
fn local_datetime(
    tz: Tz,
    date: chrono::NaiveDate,
    time: chrono::NaiveTime,
) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(time)).earliest()
}
