//! The dosage interpreter: classifies a free-text instruction into one
//! schedule shape, extracts its parameters, and computes the exact quantity
//! to dispense for the drug at hand.
//!
//! Pure and stateless: the same input always produces the same result, and
//! malformed input is reported on the result value, never thrown.

pub mod duration;
pub mod types;

mod quantity;
mod shapes;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::drug::DrugDescriptor;
use crate::frequency;

use duration::parse_duration;
use shapes::ShapeMatch;

pub use types::{ParseResult, Schedule, ScheduleKind, SchedulePattern};

use types::SplitPattern;

/// Why an instruction failed to interpret.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Please enter a prescription")]
    EmptyInput,

    #[error("Could not parse prescription. Try formats like '2 BD x 5 days' or '1-0-1 x 7 days'")]
    UnrecognizedGrammar,

    #[error("Unknown frequency code '{0}'. Use OD, BD, TDS, QDS, Q6H, Q8H, or Q12H")]
    UnknownFrequencyCode(String),

    #[error("Could not parse duration: '{0}'. Try 'x 5 days', '5d', or just '5'")]
    InvalidDuration(String),

    #[error("Could not find dose quantity. Start with a number (e.g., '2 BD x 5 days')")]
    MissingDose,

    #[error("Could not find frequency. Use OD, BD, TDS, QDS, Q6H, Q8H, or Q12H")]
    MissingFrequency,

    #[error("Could not find duration. Add 'x N days' or 'x N/7'")]
    MissingDuration,

    #[error("0-12-24H schedule is only valid for injectable drugs; this drug is a '{form}'")]
    NotInjectable { form: String },

    #[error("No bottle size is configured for this {form}; cannot convert millilitres to bottles")]
    MissingBottleSize { form: String },

    #[error("A morning-noon-evening pattern is not supported for {form} drugs")]
    UnsupportedCombination { form: String },

    #[error("Computed quantity is zero; check the dose values")]
    ZeroQuantity,
}

/// Interpret an instruction for a concrete drug. Classification is driven by
/// the input text; the quantity formula by the drug's dispensing category.
pub fn parse(input: &str, drug: &DrugDescriptor) -> ParseResult {
    interpret(input, Some(drug))
}

/// Interpret an instruction with no drug context (live preview before a drug
/// is chosen). Quantities are the schedule's own totals, uncategorized.
pub fn parse_schedule(input: &str) -> ParseResult {
    interpret(input, None)
}

fn interpret(input: &str, drug: Option<&DrugDescriptor>) -> ParseResult {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParseResult::invalid([ParseError::EmptyInput]);
    }

    match shapes::classify(trimmed, drug) {
        Some(ShapeMatch::Parsed(schedule)) => {
            let quantity = match drug {
                Some(drug) => quantity::dispense_quantity(&schedule, drug),
                None => quantity::schedule_quantity(&schedule),
            };
            match quantity {
                Ok(quantity) => {
                    debug!(
                        shape = schedule.kind().as_str(),
                        quantity, "interpreted dosage instruction"
                    );
                    build_result(&schedule, quantity)
                }
                Err(error) => ParseResult::invalid([error]),
            }
        }
        Some(ShapeMatch::Invalid(result)) => result,
        None => partial_feedback(trimmed),
    }
}

/// Canonical display text for a valid result. Invalid results format to an
/// empty string.
pub fn format(result: &ParseResult) -> String {
    if !result.is_valid {
        return String::new();
    }
    if let Some(text) = &result.display_text {
        return text.clone();
    }

    let mut parts = Vec::new();
    if let Some(dose) = &result.dose_quantity {
        parts.push(dose.clone());
    }
    if let Some(code) = &result.frequency_code {
        if !matches!(code.as_str(), "SPLIT" | "CUSTOM" | "TAPER") {
            parts.push(code.clone());
        }
    }
    if let Some(duration) = &result.duration {
        if !matches!(
            result.schedule_type,
            Some(ScheduleKind::Stat | ScheduleKind::Prn)
        ) {
            parts.push(format!("x {duration}"));
        }
    }
    parts.join(" ")
}

pub(crate) fn dose_label(dose: f64, unit: &Option<String>) -> String {
    match unit {
        Some(unit) => format!("{dose} {unit}"),
        None => format!("{dose}"),
    }
}

fn build_result(schedule: &Schedule, quantity: u32) -> ParseResult {
    let base = ParseResult {
        is_valid: true,
        quantity_to_dispense: Some(quantity),
        schedule_type: Some(schedule.kind()),
        ..Default::default()
    };

    match schedule {
        Schedule::Standard {
            dose,
            unit,
            frequency,
            duration,
        } => {
            let dose_quantity = dose_label(*dose, unit);
            ParseResult {
                display_text: Some(format!(
                    "{dose_quantity} {} x {}",
                    frequency.code, duration.label
                )),
                dose_quantity: Some(dose_quantity),
                frequency: Some(frequency.label.to_string()),
                frequency_code: Some(frequency.code.to_string()),
                duration: Some(duration.label.clone()),
                duration_days: Some(duration.days),
                schedule_pattern: Some(SchedulePattern::Standard {
                    frequency_code: frequency.code.to_string(),
                    times_per_day: frequency.times_per_day,
                }),
                ..base
            }
        }

        Schedule::SplitDose {
            morning,
            noon,
            evening,
            duration,
        } => {
            let daily_total = morning + noon + evening;
            let mut parts = Vec::new();
            if *morning > 0.0 {
                parts.push(format!("{morning} morning"));
            }
            if *noon > 0.0 {
                parts.push(format!("{noon} noon"));
            }
            if *evening > 0.0 {
                parts.push(format!("{evening} evening"));
            }
            let dose_quantity = format!("{morning}-{noon}-{evening}");
            ParseResult {
                display_text: Some(format!("{dose_quantity} x {}", duration.label)),
                frequency: Some(format!("{} ({daily_total}/day)", parts.join(", "))),
                frequency_code: Some("SPLIT".to_string()),
                dose_quantity: Some(dose_quantity),
                duration: Some(duration.label.clone()),
                duration_days: Some(duration.days),
                schedule_pattern: Some(SchedulePattern::SplitDose {
                    pattern: SplitPattern {
                        morning: *morning,
                        noon: *noon,
                        evening: *evening,
                    },
                    daily_total,
                }),
                ..base
            }
        }

        Schedule::Taper { doses } => {
            let duration_days = doses.len() as u32;
            let dose_quantity = doses
                .iter()
                .map(|dose| dose.to_string())
                .collect::<Vec<_>>()
                .join("-");
            ParseResult {
                display_text: Some(format!("{dose_quantity} taper")),
                dose_quantity: Some(dose_quantity),
                frequency: Some("Taper schedule".to_string()),
                frequency_code: Some("TAPER".to_string()),
                duration: Some(format!("{duration_days} days")),
                duration_days: Some(duration_days),
                schedule_pattern: Some(SchedulePattern::Taper {
                    doses: doses.clone(),
                    duration_days,
                }),
                ..base
            }
        }

        Schedule::Stat { dose, unit } => {
            let dose_quantity = dose_label(*dose, unit);
            ParseResult {
                display_text: Some(format!("{dose_quantity} STAT")),
                dose_quantity: Some(dose_quantity),
                frequency: Some("Immediately (STAT)".to_string()),
                frequency_code: Some("STAT".to_string()),
                duration: Some("Single dose".to_string()),
                duration_days: Some(1),
                ..base
            }
        }

        Schedule::Prn { dose, unit, bound } => {
            let dose_quantity = dose_label(*dose, unit);
            match bound {
                None => ParseResult {
                    display_text: Some(format!("{dose_quantity} PRN")),
                    dose_quantity: Some(dose_quantity),
                    frequency: Some("As needed (PRN)".to_string()),
                    frequency_code: Some("PRN".to_string()),
                    ..base
                },
                Some(bound) => ParseResult {
                    display_text: Some(format!(
                        "{dose_quantity} PRN (max {}/24h) x {}",
                        bound.max_daily, bound.duration.label
                    )),
                    dose_quantity: Some(dose_quantity),
                    frequency: Some(format!("As needed (max {}/24h)", bound.max_daily)),
                    frequency_code: Some("PRN".to_string()),
                    duration: Some(bound.duration.label.clone()),
                    duration_days: Some(bound.duration.days),
                    schedule_pattern: Some(SchedulePattern::Prn {
                        max_daily: bound.max_daily,
                        duration_days: bound.duration.days,
                    }),
                    ..base
                },
            }
        }

        Schedule::Patch {
            change_interval_days,
            duration,
        } => ParseResult {
            display_text: Some(format!(
                "Change every {change_interval_days} days x {}",
                duration.label
            )),
            dose_quantity: Some("1".to_string()),
            frequency: Some(format!("Every {change_interval_days} days")),
            frequency_code: Some("INTERVAL".to_string()),
            duration: Some(duration.label.clone()),
            duration_days: Some(duration.days),
            schedule_pattern: Some(SchedulePattern::Interval {
                change_interval_days: *change_interval_days,
                duration_days: duration.days,
            }),
            ..base
        },

        Schedule::CustomInterval {
            dose,
            unit,
            intervals_hours,
        } => {
            let dose_quantity = dose_label(*dose, unit);
            let total_doses = intervals_hours.len();
            let last_hour = intervals_hours.iter().max().copied().unwrap_or(0);
            let offsets = intervals_hours
                .iter()
                .map(|hour| format!("{hour}h"))
                .collect::<Vec<_>>()
                .join(", ");
            ParseResult {
                display_text: Some(format!("{dose_quantity} at {offsets}")),
                dose_quantity: Some(dose_quantity),
                frequency: Some(format!("Custom intervals ({total_doses} doses)")),
                frequency_code: Some("CUSTOM".to_string()),
                duration: Some("Custom schedule".to_string()),
                duration_days: Some(last_hour.div_ceil(24) + 1),
                schedule_pattern: Some(SchedulePattern::CustomInterval {
                    intervals_hours: intervals_hours.clone(),
                    dose_per_interval: *dose,
                    total_doses,
                }),
                ..base
            }
        }

        Schedule::InjectableInterval { dose, unit } => {
            let dose_quantity = dose_label(*dose, unit);
            ParseResult {
                display_text: Some(format!("{dose_quantity} at 0, 12, 24 hours")),
                dose_quantity: Some(dose_quantity),
                frequency: Some("At 0, 12, 24 hours (0-12-24H)".to_string()),
                frequency_code: Some("0-12-24H".to_string()),
                duration: Some("24 hours (3 doses)".to_string()),
                duration_days: Some(1),
                schedule_pattern: Some(SchedulePattern::InjectableInterval {
                    intervals_hours: vec![0, 12, 24],
                    dose_per_interval: *dose,
                    total_doses: 3,
                }),
                ..base
            }
        }

        Schedule::Topical { units } => {
            let unit_label = if *units == 1 { "tube" } else { "tubes" };
            ParseResult {
                display_text: Some(format!("{units} {unit_label}")),
                dose_quantity: Some(units.to_string()),
                frequency: Some("As directed".to_string()),
                frequency_code: Some("TOPICAL".to_string()),
                duration: Some("As directed".to_string()),
                schedule_pattern: Some(SchedulePattern::Topical { quantity: *units }),
                ..base
            }
        }
    }
}

// ── Partial feedback ────────────────────────────────────────────────────────
// When nothing matched, salvage whatever components are recognizable so the
// clinician is told which part is wrong rather than "invalid input".

static RE_PARTIAL_DOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(ml|mg|tabs?|capsules?|caps?)?").unwrap());

static RE_ANY_FREQ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(od|bd|bid|tds|tid|qds|qid|q6h|q8h|q12h)\b").unwrap());

static RE_DURATION_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)x\s*(.+)$").unwrap());

static RE_FREQ_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+(?:\.\d+)?\s*(?:ml|mg|tabs?|capsules?|caps?)?\s*([a-z][a-z0-9]*)\s*[x*/]")
        .unwrap()
});

fn partial_feedback(input: &str) -> ParseResult {
    let mut result = ParseResult::default();

    if let Some(caps) = RE_PARTIAL_DOSE.captures(input) {
        let mut dose = caps[1].to_string();
        if let Some(unit) = caps.get(2) {
            dose.push(' ');
            dose.push_str(unit.as_str());
        }
        result.dose_quantity = Some(dose);
    }

    if let Some(caps) = RE_ANY_FREQ.captures(input) {
        if let Some(freq) = frequency::parse_frequency(&caps[1]) {
            result.frequency = Some(freq.label.to_string());
            result.frequency_code = Some(freq.code.to_string());
        }
    }

    if let Some(caps) = RE_DURATION_TAIL.captures(input) {
        if let Some(duration) = parse_duration(&caps[1]) {
            result.duration = Some(duration.label);
            result.duration_days = Some(duration.days);
        }
    }

    let mut errors = Vec::new();
    if result.dose_quantity.is_none() {
        errors.push(ParseError::MissingDose);
    }
    if result.frequency_code.is_none() {
        match unknown_code(input) {
            Some(token) => errors.push(ParseError::UnknownFrequencyCode(token)),
            None => errors.push(ParseError::MissingFrequency),
        }
    }
    if result.duration.is_none() {
        errors.push(ParseError::MissingDuration);
    }
    if errors.is_empty() {
        errors.push(ParseError::UnrecognizedGrammar);
    }

    debug!(input, "no grammar shape matched; returning partial feedback");
    result.errors = errors.iter().map(ToString::to_string).collect();
    result
}

/// A token sitting in the frequency slot that the table does not know
/// ("2 XYZ x 5 days") is worth naming in the error.
fn unknown_code(input: &str) -> Option<String> {
    const UNIT_WORDS: &[&str] = &[
        "ML", "MG", "TAB", "TABS", "CAP", "CAPS", "CAPSULE", "CAPSULES", "TUBE", "TUBES",
    ];

    let caps = RE_FREQ_SLOT.captures(input)?;
    let token = caps[1].to_uppercase();
    if UNIT_WORDS.contains(&token.as_str()) {
        return None;
    }
    Some(token)
}
