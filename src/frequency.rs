//! The frequency table: clinical frequency codes mapped to administrations
//! per day. Compile-time constant data, never user-configurable.

use serde::Serialize;

/// A resolved frequency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frequency {
    /// Canonical code (aliases like BID resolve to BD).
    pub code: &'static str,
    /// Human label used verbatim in parse results, e.g. "Twice daily (BD)".
    pub label: &'static str,
    pub times_per_day: u32,
}

struct Entry {
    code: &'static str,
    canonical: &'static str,
    label: &'static str,
    times_per_day: u32,
}

/// BID/TID/QID are prescriber-habit aliases for the BD/TDS/QDS house style.
const TABLE: &[Entry] = &[
    Entry { code: "OD", canonical: "OD", label: "Once daily (OD)", times_per_day: 1 },
    Entry { code: "BD", canonical: "BD", label: "Twice daily (BD)", times_per_day: 2 },
    Entry { code: "BID", canonical: "BD", label: "Twice daily (BD)", times_per_day: 2 },
    Entry { code: "TDS", canonical: "TDS", label: "Three times daily (TDS)", times_per_day: 3 },
    Entry { code: "TID", canonical: "TDS", label: "Three times daily (TDS)", times_per_day: 3 },
    Entry { code: "QDS", canonical: "QDS", label: "Four times daily (QDS)", times_per_day: 4 },
    Entry { code: "QID", canonical: "QDS", label: "Four times daily (QDS)", times_per_day: 4 },
    Entry { code: "Q6H", canonical: "Q6H", label: "Every 6 hours (Q6H)", times_per_day: 4 },
    Entry { code: "Q8H", canonical: "Q8H", label: "Every 8 hours (Q8H)", times_per_day: 3 },
    Entry { code: "Q12H", canonical: "Q12H", label: "Every 12 hours (Q12H)", times_per_day: 2 },
];

/// Look up a frequency code, case-insensitively after trimming.
/// Unknown codes return `None`, never an error.
pub fn parse_frequency(code: &str) -> Option<Frequency> {
    let normalized = code.trim().to_uppercase();
    TABLE
        .iter()
        .find(|entry| entry.code == normalized)
        .map(|entry| Frequency {
            code: entry.canonical,
            label: entry.label,
            times_per_day: entry.times_per_day,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_codes_to_times_per_day() {
        let expected = [
            ("OD", 1),
            ("BD", 2),
            ("TDS", 3),
            ("QDS", 4),
            ("Q6H", 4),
            ("Q8H", 3),
            ("Q12H", 2),
        ];
        for (code, times) in expected {
            let freq = parse_frequency(code).unwrap();
            assert_eq!(freq.times_per_day, times, "{code}");
            assert_eq!(freq.code, code);
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_codes() {
        assert_eq!(parse_frequency("BID").unwrap().code, "BD");
        assert_eq!(parse_frequency("TID").unwrap().code, "TDS");
        assert_eq!(parse_frequency("QID").unwrap().code, "QDS");
        assert_eq!(
            parse_frequency("BID").unwrap().times_per_day,
            parse_frequency("BD").unwrap().times_per_day
        );
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        for code in ["OD", "BD", "TDS", "QDS", "Q6H", "Q8H", "Q12H"] {
            let upper = parse_frequency(code).unwrap();
            let lower = parse_frequency(&code.to_lowercase()).unwrap();
            let padded = parse_frequency(&format!("  {code} ")).unwrap();
            assert_eq!(upper, lower);
            assert_eq!(upper, padded);
        }
        assert_eq!(parse_frequency("Bd").unwrap().code, "BD");
    }

    #[test]
    fn unknown_codes_return_none() {
        assert!(parse_frequency("XYZ").is_none());
        assert!(parse_frequency("").is_none());
        assert!(parse_frequency("Q4H").is_none());
    }

    #[test]
    fn labels_match_house_style() {
        assert_eq!(parse_frequency("QDS").unwrap().label, "Four times daily (QDS)");
        assert_eq!(parse_frequency("BD").unwrap().label, "Twice daily (BD)");
        assert_eq!(parse_frequency("Q8H").unwrap().label, "Every 8 hours (Q8H)");
    }
}
