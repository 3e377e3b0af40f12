//! Posology interprets free-text prescription shorthand ("2 BD x 5 days",
//! "4-3-2-1 taper", "PRN max 8/24h x 7 days") into structured dispensing
//! instructions: frequency, duration, a schedule pattern for administration
//! rounds, and an exact quantity to dispense for the drug's form.
//!
//! The interpreter is a pure function of its inputs. It does no I/O, holds
//! no state, and is safe to call concurrently.

pub mod drug;
pub mod frequency;
pub mod parse;
pub mod schedule; // administration-time defaults for ward rounds

pub use drug::{DispensingCategory, DrugDescriptor, DrugForm, UnitType};
pub use frequency::{parse_frequency, Frequency};
pub use parse::{parse, parse_schedule, ParseError, ParseResult, Schedule, ScheduleKind, SchedulePattern};
pub use schedule::{smart_defaults, times_for_day, TimePattern};
