use serde::{Deserialize, Serialize};

use crate::frequency::Frequency;

use super::duration::Duration;
use super::ParseError;

/// One parsed schedule shape. A single input produces exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Schedule {
    /// "2 BD x 5 days" — dose, frequency code, day count.
    Standard {
        dose: f64,
        unit: Option<String>,
        frequency: Frequency,
        duration: Duration,
    },
    /// "1-0-1 x 30 days" — morning-noon-evening pattern.
    SplitDose {
        morning: f64,
        noon: f64,
        evening: f64,
        duration: Duration,
    },
    /// "4-3-2-1 taper" — one dose per listed day.
    Taper { doses: Vec<f64> },
    /// "2 STAT" — single immediate dose.
    Stat { dose: f64, unit: Option<String> },
    /// "2 PRN" or "2 PRN max 8/24h x 7 days".
    Prn {
        dose: f64,
        unit: Option<String>,
        bound: Option<PrnBound>,
    },
    /// "change every 3 days x 30 days".
    Patch {
        change_interval_days: u32,
        duration: Duration,
    },
    /// "4 tabs 0h,8h,24h,36h,48h,60h" — explicit hour offsets from start.
    CustomInterval {
        dose: f64,
        unit: Option<String>,
        intervals_hours: Vec<u32>,
    },
    /// "2 0-12-24H" — three doses at 0, 12 and 24 hours, injectables only.
    InjectableInterval { dose: f64, unit: Option<String> },
    /// "2 tubes" — direct unit count, topical forms only.
    Topical { units: u32 },
}

impl Schedule {
    pub fn kind(&self) -> ScheduleKind {
        match self {
            Self::Standard { .. } => ScheduleKind::Standard,
            Self::SplitDose { .. } => ScheduleKind::SplitDose,
            Self::Taper { .. } => ScheduleKind::Taper,
            Self::Stat { .. } => ScheduleKind::Stat,
            Self::Prn { .. } => ScheduleKind::Prn,
            Self::Patch { .. } => ScheduleKind::Interval,
            Self::CustomInterval { .. } => ScheduleKind::CustomInterval,
            Self::InjectableInterval { .. } => ScheduleKind::InjectableInterval,
            Self::Topical { .. } => ScheduleKind::Topical,
        }
    }
}

/// The optional "max M/24h x D days" clause on a PRN instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct PrnBound {
    pub max_daily: u32,
    pub duration: Duration,
}

/// Serialized schedule-type tag. String values match what the surrounding
/// system stores on dispensing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Standard,
    SplitDose,
    Taper,
    Stat,
    Prn,
    Interval,
    CustomInterval,
    InjectableInterval,
    Topical,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::SplitDose => "split_dose",
            Self::Taper => "taper",
            Self::Stat => "stat",
            Self::Prn => "prn",
            Self::Interval => "interval",
            Self::CustomInterval => "custom_interval",
            Self::InjectableInterval => "injectable_interval",
            Self::Topical => "topical",
        }
    }
}

/// Morning-noon-evening components of a split dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPattern {
    pub morning: f64,
    pub noon: f64,
    pub evening: f64,
}

/// Structured echo of the matched shape's parameters, stored alongside the
/// prescription for administration-time generation. Absent for STAT and
/// unbounded PRN; there is nothing beyond dose and frequency to record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulePattern {
    Standard {
        frequency_code: String,
        times_per_day: u32,
    },
    SplitDose {
        pattern: SplitPattern,
        daily_total: f64,
    },
    Taper {
        doses: Vec<f64>,
        duration_days: u32,
    },
    Prn {
        max_daily: u32,
        duration_days: u32,
    },
    Interval {
        change_interval_days: u32,
        duration_days: u32,
    },
    CustomInterval {
        intervals_hours: Vec<u32>,
        dose_per_interval: f64,
        total_doses: usize,
    },
    InjectableInterval {
        intervals_hours: Vec<u32>,
        dose_per_interval: f64,
        total_doses: usize,
    },
    Topical {
        quantity: u32,
    },
}

/// Outcome of one parse call. A transient value object: the interpreter
/// never mutates caller state, and identical inputs produce identical
/// results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub is_valid: bool,
    /// Dose as entered, with its unit word when one was given ("5 ml").
    pub dose_quantity: Option<String>,
    /// Human frequency label, e.g. "Twice daily (BD)".
    pub frequency: Option<String>,
    pub frequency_code: Option<String>,
    /// Human duration label, e.g. "5 days" or "Single dose".
    pub duration: Option<String>,
    pub duration_days: Option<u32>,
    pub quantity_to_dispense: Option<u32>,
    pub schedule_type: Option<ScheduleKind>,
    pub schedule_pattern: Option<SchedulePattern>,
    pub display_text: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ParseResult {
    pub(crate) fn invalid(errors: impl IntoIterator<Item = ParseError>) -> Self {
        Self {
            errors: errors.into_iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
