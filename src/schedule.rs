//! Administration-time defaults for ward medication rounds.
//!
//! Given a frequency (a bare code, or a label like "Twice daily (BD)") and
//! the current time, produce sensible dose times: day one starts from where
//! the clock is, subsequent days use the ward's standard times. Persisting
//! the generated rounds is the caller's concern.

use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::frequency;

/// Dose times for the first day and for every day after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePattern {
    pub day_one: Vec<NaiveTime>,
    pub subsequent: Vec<NaiveTime>,
}

static RE_PAREN_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\((bid|bd|tid|tds|qid|qds|q12h|q8h|q6h|q4h|q2h|od|prn)\)").unwrap()
});

static RE_WORD_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bid|bd|tid|tds|qid|qds|q12h|q8h|q6h|q4h|q2h|od|prn)\b").unwrap()
});

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Pull the frequency code out of descriptive text like "Twice daily (BD)".
fn extract_code(frequency_text: &str) -> String {
    if let Some(caps) = RE_PAREN_CODE.captures(frequency_text) {
        return caps[1].to_uppercase();
    }
    if let Some(caps) = RE_WORD_CODE.captures(frequency_text) {
        return caps[1].to_uppercase();
    }
    frequency_text.trim().to_uppercase()
}

/// Default administration times for a frequency, anchored at `now`.
///
/// PRN has no schedule (doses are on demand). Q4H/Q2H anchor to the next
/// whole hour; the daily frequencies use the ward standard times.
pub fn smart_defaults(frequency_text: &str, now: NaiveTime) -> TimePattern {
    let raw = extract_code(frequency_text);
    let code = frequency::parse_frequency(&raw)
        .map(|freq| freq.code.to_string())
        .unwrap_or(raw);

    match code.as_str() {
        "PRN" => TimePattern {
            day_one: vec![],
            subsequent: vec![],
        },
        "BD" | "Q12H" => {
            let standard = vec![t(6, 0), t(18, 0)];
            let next = standard
                .iter()
                .copied()
                .find(|time| *time > now)
                .unwrap_or(t(18, 0));
            TimePattern {
                day_one: vec![now, next],
                subsequent: standard,
            }
        }
        "TDS" | "Q8H" => remaining_of(&[t(6, 0), t(14, 0), t(22, 0)], now, &[t(14, 0), t(22, 0)]),
        "QDS" | "Q6H" => remaining_of(
            &[t(6, 0), t(12, 0), t(18, 0), t(0, 0)],
            now,
            &[t(12, 0), t(18, 0), t(0, 0)],
        ),
        "Q4H" => interval_from(now, 4, 6),
        "Q2H" => interval_from(now, 2, 12),
        "OD" => {
            let first = if now >= t(6, 0) { now } else { t(6, 0) };
            TimePattern {
                day_one: vec![first],
                subsequent: vec![t(6, 0)],
            }
        }
        _ => TimePattern {
            day_one: vec![t(6, 0)],
            subsequent: vec![t(6, 0)],
        },
    }
}

/// Day one gets the standard times still ahead of `now`; when none remain,
/// fall back to a late-start subset rather than an empty day.
fn remaining_of(standard: &[NaiveTime], now: NaiveTime, fallback: &[NaiveTime]) -> TimePattern {
    let day_one: Vec<NaiveTime> = standard.iter().copied().filter(|time| *time >= now).collect();
    TimePattern {
        day_one: if day_one.is_empty() {
            fallback.to_vec()
        } else {
            day_one
        },
        subsequent: standard.to_vec(),
    }
}

fn interval_from(now: NaiveTime, every_hours: u32, doses_per_day: usize) -> TimePattern {
    // First dose at the next whole hour (or now, when already on the hour).
    let start = if now.minute() == 0 && now.second() == 0 {
        now
    } else {
        t((now.hour() + 1) % 24, 0)
    };
    let times: Vec<NaiveTime> = (0..doses_per_day)
        .map(|dose| t((start.hour() + every_hours * dose as u32) % 24, 0))
        .collect();
    TimePattern {
        day_one: vec![times[0]],
        subsequent: times,
    }
}

/// Times to administer on a given day (1-based) of the course.
pub fn times_for_day(pattern: &TimePattern, day_number: u32) -> &[NaiveTime] {
    if day_number <= 1 {
        &pattern.day_one
    } else {
        &pattern.subsequent
    }
}
