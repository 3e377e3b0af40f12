//! Grammar shape matchers. Each prescription string expresses exactly one
//! schedule shape; `classify` tries the matchers in a fixed order and the
//! first structural match wins, which keeps the shapes mutually exclusive
//! and the precedence auditable in one place.

use std::sync::LazyLock;

use regex::Regex;

use crate::drug::DrugDescriptor;
use crate::frequency;

use super::duration::{parse_duration, Duration};
use super::types::{ParseResult, PrnBound, Schedule};
use super::ParseError;

/// A matcher either produces a schedule or a fully-formed invalid result
/// (e.g. a recognizable shape with an unparseable duration tail).
pub(crate) enum ShapeMatch {
    Parsed(Schedule),
    Invalid(ParseResult),
}

/// Ordered first-match-wins classification. The topical count form is gated
/// on the drug and checked ahead of the chain; the 0-12-24H form must come
/// before custom intervals.
pub(crate) fn classify(input: &str, drug: Option<&DrugDescriptor>) -> Option<ShapeMatch> {
    if let Some(drug) = drug {
        if drug.form.is_topical() {
            if let Some(matched) = match_topical(input) {
                return Some(matched);
            }
        }
    }

    match_taper(input)
        .or_else(|| match_injectable(input, drug))
        .or_else(|| match_custom_interval(input))
        .or_else(|| match_patch(input))
        .or_else(|| match_split_dose(input))
        .or_else(|| match_stat(input))
        .or_else(|| match_prn(input))
        .or_else(|| match_standard(input))
}

fn unit_of(caps: &regex::Captures<'_>, index: usize) -> Option<String> {
    caps.get(index).map(|m| m.as_str().to_string())
}

// ── Taper: "4-3-2-1 taper" ──────────────────────────────────────────────────

static RE_TAPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^((?:\d+(?:\.\d+)?-)+\d+(?:\.\d+)?)\s*(taper)?$").unwrap());

fn match_taper(input: &str) -> Option<ShapeMatch> {
    let caps = RE_TAPER.captures(input)?;

    let doses: Vec<f64> = caps[1]
        .split('-')
        .map(|dose| dose.parse().ok())
        .collect::<Option<_>>()?;
    if doses.len() < 2 {
        return None;
    }

    // Without the keyword, only a non-increasing sequence reads as a taper;
    // anything else falls through (a 3-value pattern may be a split dose).
    if caps.get(2).is_none() && !doses.windows(2).all(|pair| pair[1] <= pair[0]) {
        return None;
    }

    Some(ShapeMatch::Parsed(Schedule::Taper { doses }))
}

// ── Injectable interval: "2 0-12-24H", "60mg 0-12-24 HRS" ───────────────────

static RE_INJECTABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(mg|ml|units?)?\s*0-12-24\s*(?:h|hrs?)$").unwrap()
});

fn match_injectable(input: &str, drug: Option<&DrugDescriptor>) -> Option<ShapeMatch> {
    let caps = RE_INJECTABLE.captures(input)?;
    let dose: f64 = caps[1].parse().ok()?;
    let unit = unit_of(&caps, 2);

    if let Some(drug) = drug {
        if !drug.form.is_injectable() {
            return Some(ShapeMatch::Invalid(ParseResult::invalid([
                ParseError::NotInjectable {
                    form: drug.form.as_str().to_string(),
                },
            ])));
        }
    }

    Some(ShapeMatch::Parsed(Schedule::InjectableInterval { dose, unit }))
}

// ── Custom intervals: "4 tabs 0h,8h,24h,36h,48h,60h" ────────────────────────

static RE_CUSTOM_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(tabs?|capsules?|caps?|ml|mg)?\s*((?:\d+h?,?\s*)+)$")
        .unwrap()
});

static RE_CUSTOM_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(tabs?|capsules?|caps?|ml|mg)?\s*at\s*((?:\d+,?\s*)+)$")
        .unwrap()
});

static RE_CUSTOM_DOSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(mg|ml)\s+((?:\d+,)+\d+)\s*(?:hrs?)?$").unwrap()
});

static RE_HOUR_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)h").unwrap());

fn match_custom_interval(input: &str) -> Option<ShapeMatch> {
    let caps = RE_CUSTOM_HOURS
        .captures(input)
        .or_else(|| RE_CUSTOM_AT.captures(input))
        .or_else(|| RE_CUSTOM_DOSED.captures(input))?;

    let dose: f64 = caps[1].parse().ok()?;
    let unit = unit_of(&caps, 2);

    let cleaned = RE_HOUR_SUFFIX.replace_all(&caps[3], "");
    let mut intervals_hours: Vec<u32> = cleaned
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect::<Option<_>>()?;

    if intervals_hours.len() < 2 {
        return None;
    }

    // A schedule always starts at hour 0; prepend it when omitted.
    if intervals_hours[0] != 0 {
        intervals_hours.insert(0, 0);
    }

    Some(ShapeMatch::Parsed(Schedule::CustomInterval {
        dose,
        unit,
        intervals_hours,
    }))
}

// ── Patch: "change every 3 days x 30 days" ──────────────────────────────────

static RE_PATCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:change\s+)?every\s+(\d+)\s*days?\s*x\s*(\d+)\s*days?$").unwrap()
});

fn match_patch(input: &str) -> Option<ShapeMatch> {
    let caps = RE_PATCH.captures(input)?;
    let change_interval_days: u32 = caps[1].parse().ok()?;
    let duration_days: u32 = caps[2].parse().ok()?;

    if change_interval_days < 1 {
        return None;
    }

    Some(ShapeMatch::Parsed(Schedule::Patch {
        change_interval_days,
        duration: Duration::days(duration_days),
    }))
}

// ── Split dose: "1-0-1 x 30 days" ───────────────────────────────────────────

static RE_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)\s*[x*/]\s*(.+)$").unwrap()
});

static RE_SPLIT_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)\s+for\s+(.+)$").unwrap()
});

fn match_split_dose(input: &str) -> Option<ShapeMatch> {
    let caps = RE_SPLIT
        .captures(input)
        .or_else(|| RE_SPLIT_FOR.captures(input))?;

    let morning: f64 = caps[1].parse().ok()?;
    let noon: f64 = caps[2].parse().ok()?;
    let evening: f64 = caps[3].parse().ok()?;
    let tail = &caps[4];

    let Some(duration) = parse_duration(tail) else {
        let mut partial = ParseResult::invalid([ParseError::InvalidDuration(tail.to_string())]);
        partial.dose_quantity = Some(format!("{morning}-{noon}-{evening}"));
        return Some(ShapeMatch::Invalid(partial));
    };

    Some(ShapeMatch::Parsed(Schedule::SplitDose {
        morning,
        noon,
        evening,
        duration,
    }))
}

// ── STAT: "2 tabs STAT" ─────────────────────────────────────────────────────

static RE_STAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)?\s*(tabs?|capsules?|caps?|ml)?\s*stat$").unwrap()
});

fn match_stat(input: &str) -> Option<ShapeMatch> {
    let caps = RE_STAT.captures(input)?;
    let dose: f64 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1.0,
    };
    let unit = unit_of(&caps, 2);

    Some(ShapeMatch::Parsed(Schedule::Stat { dose, unit }))
}

// ── PRN: "2 PRN", "PRN max 8/24h x 7 days" ──────────────────────────────────

static RE_PRN_BOUNDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)?\s*(tabs?|capsules?|caps?|ml)?\s*prn\s+max\s+(\d+)/24h\s*x\s*(\d+)\s*days?$",
    )
    .unwrap()
});

static RE_PRN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)?\s*(tabs?|capsules?|caps?|ml)?\s*prn$").unwrap()
});

fn match_prn(input: &str) -> Option<ShapeMatch> {
    if let Some(caps) = RE_PRN_BOUNDED.captures(input) {
        let dose: f64 = match caps.get(1) {
            Some(m) => m.as_str().parse().ok()?,
            None => 1.0,
        };
        let unit = unit_of(&caps, 2);
        let max_daily: u32 = caps[3].parse().ok()?;
        let duration_days: u32 = caps[4].parse().ok()?;

        return Some(ShapeMatch::Parsed(Schedule::Prn {
            dose,
            unit,
            bound: Some(PrnBound {
                max_daily,
                duration: Duration::days(duration_days),
            }),
        }));
    }

    let caps = RE_PRN.captures(input)?;
    let dose: f64 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1.0,
    };
    let unit = unit_of(&caps, 2);

    Some(ShapeMatch::Parsed(Schedule::Prn {
        dose,
        unit,
        bound: None,
    }))
}

// ── Standard: "2 BD x 5 days" ───────────────────────────────────────────────

static RE_STANDARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)\s*(ml|mg|tabs?|capsules?|caps?)?\s*(od|bd|bid|tds|tid|qds|qid|q6h|q8h|q12h)\s*[x*/]\s*(.+)$",
    )
    .unwrap()
});

static RE_STANDARD_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)\s*(ml|mg|tabs?|capsules?|caps?)?\s*(od|bd|bid|tds|tid|qds|qid|q6h|q8h|q12h)\s+for\s+(.+)$",
    )
    .unwrap()
});

fn match_standard(input: &str) -> Option<ShapeMatch> {
    let caps = RE_STANDARD
        .captures(input)
        .or_else(|| RE_STANDARD_FOR.captures(input))?;

    let dose: f64 = caps[1].parse().ok()?;
    let unit = unit_of(&caps, 2);
    // The alternation only admits codes the table knows, aliases included.
    let frequency = frequency::parse_frequency(&caps[3])?;
    let tail = &caps[4];

    let Some(duration) = parse_duration(tail) else {
        let mut partial = ParseResult::invalid([ParseError::InvalidDuration(tail.to_string())]);
        partial.dose_quantity = Some(super::dose_label(dose, &unit));
        partial.frequency = Some(frequency.label.to_string());
        partial.frequency_code = Some(frequency.code.to_string());
        return Some(ShapeMatch::Invalid(partial));
    };

    Some(ShapeMatch::Parsed(Schedule::Standard {
        dose,
        unit,
        frequency,
        duration,
    }))
}

// ── Topical count: "2 tubes" (topical forms only) ───────────────────────────

static RE_TOPICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s*(tubes?)?$").unwrap());

fn match_topical(input: &str) -> Option<ShapeMatch> {
    let caps = RE_TOPICAL.captures(input)?;
    let units: u32 = caps[1].parse().ok()?;
    if units < 1 {
        return None;
    }

    Some(ShapeMatch::Parsed(Schedule::Topical { units }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drug::{DrugForm, UnitType};

    fn shape(input: &str) -> Schedule {
        match classify(input, None) {
            Some(ShapeMatch::Parsed(schedule)) => schedule,
            other => panic!(
                "expected a schedule for {input:?}, got {}",
                match other {
                    Some(ShapeMatch::Invalid(r)) => format!("invalid: {:?}", r.errors),
                    None => "no match".to_string(),
                    _ => unreachable!(),
                }
            ),
        }
    }

    #[test]
    fn taper_with_keyword() {
        let Schedule::Taper { doses } = shape("4-3-2-1 taper") else {
            panic!("not a taper");
        };
        assert_eq!(doses, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn bare_decreasing_sequence_is_a_taper() {
        let Schedule::Taper { doses } = shape("6-5-4-3-2-1") else {
            panic!("not a taper");
        };
        assert_eq!(doses.len(), 6);
    }

    #[test]
    fn bare_non_decreasing_sequence_is_not_a_taper() {
        // "1-0-1" without keyword or duration matches nothing.
        assert!(matches!(classify("1-0-1", None), None));
        // With the keyword it is a taper regardless of shape.
        let Schedule::Taper { doses } = shape("1-2-3 taper") else {
            panic!("not a taper");
        };
        assert_eq!(doses, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn split_dose_beats_taper_when_duration_present() {
        let Schedule::SplitDose {
            morning,
            noon,
            evening,
            duration,
        } = shape("1-0-1 x 30 days")
        else {
            panic!("not a split dose");
        };
        assert_eq!((morning, noon, evening), (1.0, 0.0, 1.0));
        assert_eq!(duration.days, 30);
    }

    #[test]
    fn split_dose_with_bad_duration_is_invalid_not_unmatched() {
        let Some(ShapeMatch::Invalid(result)) = classify("1-0-1 x forever", None) else {
            panic!("expected invalid");
        };
        assert!(!result.is_valid);
        assert_eq!(result.dose_quantity.as_deref(), Some("1-0-1"));
        assert!(result.errors[0].contains("duration"));
    }

    #[test]
    fn custom_interval_spellings() {
        for input in [
            "4 tabs 0h,8h,24h,36h,48h,60h",
            "4 tabs at 0,8,24,36,48,60",
            "4mg 0,8,24,36,48,60 HRS",
        ] {
            let Schedule::CustomInterval { dose, intervals_hours, .. } = shape(input) else {
                panic!("not a custom interval: {input}");
            };
            assert_eq!(dose, 4.0, "{input}");
            assert_eq!(intervals_hours, vec![0, 8, 24, 36, 48, 60], "{input}");
        }
    }

    #[test]
    fn custom_interval_prepends_missing_zero() {
        let Schedule::CustomInterval { intervals_hours, .. } = shape("2 tabs 8h,16h") else {
            panic!("not a custom interval");
        };
        assert_eq!(intervals_hours, vec![0, 8, 16]);
    }

    #[test]
    fn single_offset_is_not_a_schedule() {
        assert!(classify("2 tabs 8h", None).is_none());
    }

    #[test]
    fn patch_with_and_without_change_keyword() {
        for input in ["change every 3 days x 30 days", "every 3 days x 30 days"] {
            let Schedule::Patch {
                change_interval_days,
                duration,
            } = shape(input)
            else {
                panic!("not a patch: {input}");
            };
            assert_eq!(change_interval_days, 3);
            assert_eq!(duration.days, 30);
        }
    }

    #[test]
    fn stat_dose_defaults_to_one() {
        let Schedule::Stat { dose, .. } = shape("STAT") else {
            panic!("not stat");
        };
        assert_eq!(dose, 1.0);

        let Schedule::Stat { dose, unit } = shape("2 tabs STAT") else {
            panic!("not stat");
        };
        assert_eq!(dose, 2.0);
        assert_eq!(unit.as_deref(), Some("tabs"));
    }

    #[test]
    fn prn_simple_and_bounded() {
        let Schedule::Prn { dose, bound, .. } = shape("2 PRN") else {
            panic!("not prn");
        };
        assert_eq!(dose, 2.0);
        assert!(bound.is_none());

        let Schedule::Prn { dose, bound, .. } = shape("PRN max 8/24h x 7 days") else {
            panic!("not prn");
        };
        assert_eq!(dose, 1.0);
        let bound = bound.unwrap();
        assert_eq!(bound.max_daily, 8);
        assert_eq!(bound.duration.days, 7);
    }

    #[test]
    fn standard_with_flexible_separators() {
        for input in ["2 BD x 5 days", "2 BD * 5", "2 BD / 5d", "2 BD for 5"] {
            let Schedule::Standard {
                dose,
                frequency,
                duration,
                ..
            } = shape(input)
            else {
                panic!("not standard: {input}");
            };
            assert_eq!(dose, 2.0, "{input}");
            assert_eq!(frequency.code, "BD", "{input}");
            assert_eq!(duration.days, 5, "{input}");
        }
    }

    #[test]
    fn standard_keeps_unit_word() {
        let Schedule::Standard { dose, unit, .. } = shape("5ml TDS x 5 days") else {
            panic!("not standard");
        };
        assert_eq!(dose, 5.0);
        assert_eq!(unit.as_deref(), Some("ml"));
    }

    #[test]
    fn injectable_interval_requires_injectable_form() {
        let Schedule::InjectableInterval { dose, .. } = shape("2 0-12-24H") else {
            panic!("not injectable interval");
        };
        assert_eq!(dose, 2.0);

        let iv = DrugDescriptor::new(DrugForm::IvBag, UnitType::Piece);
        assert!(matches!(
            classify("60mg 0-12-24 HRS", Some(&iv)),
            Some(ShapeMatch::Parsed(Schedule::InjectableInterval { .. }))
        ));

        let tablet = DrugDescriptor::new(DrugForm::Tablet, UnitType::Piece);
        let Some(ShapeMatch::Invalid(result)) = classify("2 0-12-24H", Some(&tablet)) else {
            panic!("expected invalid for tablet");
        };
        assert!(result.errors[0].contains("injectable"));
    }

    #[test]
    fn topical_count_only_for_topical_forms() {
        let cream = DrugDescriptor::new(DrugForm::Cream, UnitType::Tube);
        assert!(matches!(
            classify("2 tubes", Some(&cream)),
            Some(ShapeMatch::Parsed(Schedule::Topical { units: 2 }))
        ));
        assert!(matches!(
            classify("1", Some(&cream)),
            Some(ShapeMatch::Parsed(Schedule::Topical { units: 1 }))
        ));

        let tablet = DrugDescriptor::new(DrugForm::Tablet, UnitType::Piece);
        assert!(classify("2 tubes", Some(&tablet)).is_none());
    }

    #[test]
    fn nonsense_matches_nothing() {
        for input in ["take some medicine", "2 XYZ x 5 days", "2 BD", "x 5 days"] {
            assert!(classify(input, None).is_none(), "{input}");
        }
    }
}
