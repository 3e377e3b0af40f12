//! Duration tail parsing. Prescribers write day counts a dozen ways; all of
//! them normalize to a label plus an exact day count:
//!
//! - separators: "x 5 days", "* 5", "/ 5d", "for 5" (separator optional)
//! - day forms: "5 days", "5 day", "5d", "5 d", bare "5"
//! - week notation: "7/7" (days out of seven), "2 weeks"
//! - trailing punctuation is ignored ("5 days." works)

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A parsed duration: the normalized human label and the exact day count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub label: String,
    pub days: u32,
}

impl Duration {
    pub(crate) fn days(days: u32) -> Self {
        Self {
            label: format!("{days} days"),
            days,
        }
    }
}

// Optional separator: x, *, /, or the word "for".
const SEPARATOR: &str = r"(?:[x*/]\s*|for\s+)?";

static RE_TRAILING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;:!?]+$").unwrap());

// "N/7" week notation comes first so it is not read as separator + bare N.
static RE_WEEK_NOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^{SEPARATOR}(\d+)/7$")).unwrap());

static RE_WEEKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^{SEPARATOR}(\d+)\s*weeks?$")).unwrap());

static RE_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^{SEPARATOR}(\d+)\s*(?:days?|d)?$")).unwrap());

/// Parse a duration expression. Returns `None` when no known form matches.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let cleaned = RE_TRAILING_PUNCT.replace(input.trim(), "");
    let cleaned = cleaned.trim();

    if let Some(caps) = RE_WEEK_NOTATION.captures(cleaned) {
        let days: u32 = caps[1].parse().ok()?;
        return Some(Duration::days(days));
    }

    if let Some(caps) = RE_WEEKS.captures(cleaned) {
        let weeks: u32 = caps[1].parse().ok()?;
        return Some(Duration {
            label: format!("{weeks} weeks"),
            days: weeks * 7,
        });
    }

    if let Some(caps) = RE_DAYS.captures(cleaned) {
        let days: u32 = caps[1].parse().ok()?;
        return Some(Duration::days(days));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_day_forms() {
        let cases = [
            ("x 5 days", 5),
            ("x 7 days", 7),
            ("x 30 days", 30),
            ("5 days", 5),
            ("5 day", 5),
            ("5d", 5),
            ("5 d", 5),
            ("5", 5),
            ("* 5", 5),
            ("/ 5d", 5),
            ("for 5", 5),
        ];
        for (input, days) in cases {
            let parsed = parse_duration(input).unwrap_or_else(|| panic!("{input}"));
            assert_eq!(parsed.days, days, "{input}");
        }
    }

    #[test]
    fn parses_week_notation() {
        assert_eq!(parse_duration("x 7/7").unwrap().days, 7);
        assert_eq!(parse_duration("14/7").unwrap().days, 14);
        assert_eq!(parse_duration("x 7/7").unwrap().label, "7 days");
    }

    #[test]
    fn parses_weeks() {
        let one = parse_duration("x 1 week").unwrap();
        assert_eq!(one.days, 7);
        assert_eq!(one.label, "1 weeks");

        assert_eq!(parse_duration("x 2 weeks").unwrap().days, 14);
        assert_eq!(parse_duration("4 weeks").unwrap().days, 28);
    }

    #[test]
    fn ignores_trailing_punctuation() {
        assert_eq!(parse_duration("5 days.").unwrap().days, 5);
        assert_eq!(parse_duration("x 5 days;").unwrap().days, 5);
    }

    #[test]
    fn rejects_unparseable_tails() {
        assert!(parse_duration("until better").is_none());
        assert!(parse_duration("x five days").is_none());
        assert!(parse_duration("").is_none());
    }
}
