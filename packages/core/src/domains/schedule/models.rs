//! Typed schedule rules and their boundary validator.
//!
//! Per SPEC_FULL.md §9 redesign note 1: `schedule_rules` is stored as a
//! JSON column (see spec.md §3) but nothing downstream of the boundary
//! ever touches a raw `serde_json::Value` — everything consumes
//! [`ScheduleRules`].

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::common::DialerError;

/// The wire/storage shape of `schedule_rules` before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScheduleRules {
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub exclude_holidays: bool,
}

/// A validated, typed schedule rule set.
///
/// `days` holds each rule weekday at most once; duplicates in the raw
/// input are collapsed rather than rejected, since they resolve to the
/// same index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRules {
    pub days: Vec<Weekday>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub exclude_holidays: bool,
}

impl ScheduleRules {
    pub fn contains_day(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

impl TryFrom<RawScheduleRules> for ScheduleRules {
    type Error = DialerError;

    fn try_from(raw: RawScheduleRules) -> Result<Self, Self::Error> {
        if raw.days.is_empty() {
            return Err(DialerError::InvalidSchedule(
                "days must be non-empty".into(),
            ));
        }

        let mut days = Vec::with_capacity(raw.days.len());
        for name in &raw.days {
            let weekday = parse_weekday(name).ok_or_else(|| {
                DialerError::InvalidSchedule(format!("unrecognized weekday: {name}"))
            })?;
            if !days.contains(&weekday) {
                days.push(weekday);
            }
        }

        let start_time = parse_hh_mm(&raw.start_time).ok_or_else(|| {
            DialerError::InvalidSchedule(format!("invalid start_time: {}", raw.start_time))
        })?;
        let end_time = parse_hh_mm(&raw.end_time).ok_or_else(|| {
            DialerError::InvalidSchedule(format!("invalid end_time: {}", raw.end_time))
        })?;

        Ok(ScheduleRules {
            days,
            start_time,
            end_time,
            exclude_holidays: raw.exclude_holidays,
        })
    }
}

impl TryFrom<serde_json::Value> for ScheduleRules {
    type Error = DialerError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let raw: RawScheduleRules = serde_json::from_value(value)
            .map_err(|e| DialerError::InvalidSchedule(format!("malformed schedule_rules: {e}")))?;
        raw.try_into()
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Accepts exactly `HH:MM` in 24-hour time, per spec.md §4.1's
/// `^\d{2}:\d{2}$` rule.
fn parse_hh_mm(s: &str) -> Option<NaiveTime> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !bytes[0..2].iter().all(u8::is_ascii_digit) || !bytes[3..5].iter().all(u8::is_ascii_digit) {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}
