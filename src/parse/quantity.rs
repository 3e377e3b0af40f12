//! Quantity-to-dispense formulas. The schedule gives a raw total in its own
//! unit (pieces, millilitres, patch changes); the drug's dispensing category
//! decides how that total becomes a stock unit count. Fractional totals
//! always round up; under-dispensing is the unsafe direction.

use crate::drug::{DispensingCategory, DrugDescriptor};

use super::types::Schedule;
use super::ParseError;

/// Raw administration total for a schedule, before any category conversion.
fn raw_units(schedule: &Schedule) -> f64 {
    match schedule {
        Schedule::Standard {
            dose,
            frequency,
            duration,
            ..
        } => dose * f64::from(frequency.times_per_day) * f64::from(duration.days),
        Schedule::SplitDose {
            morning,
            noon,
            evening,
            duration,
        } => (morning + noon + evening) * f64::from(duration.days),
        Schedule::Taper { doses } => doses.iter().sum(),
        Schedule::Stat { dose, .. } => *dose,
        Schedule::Prn {
            dose, bound: None, ..
        } => *dose,
        Schedule::Prn {
            bound: Some(bound), ..
        } => f64::from(bound.max_daily) * f64::from(bound.duration.days),
        Schedule::Patch {
            change_interval_days,
            duration,
        } => match change_interval_days {
            0 => 0.0,
            interval => f64::from(duration.days.div_ceil(*interval)),
        },
        Schedule::CustomInterval {
            dose,
            intervals_hours,
            ..
        } => dose * intervals_hours.len() as f64,
        Schedule::InjectableInterval { dose, .. } => dose * 3.0,
        Schedule::Topical { units } => f64::from(*units),
    }
}

fn ceil_positive(total: f64) -> Result<u32, ParseError> {
    let rounded = total.ceil();
    if rounded < 1.0 {
        return Err(ParseError::ZeroQuantity);
    }
    Ok(rounded as u32)
}

/// Quantity with no drug context: the schedule's own total, rounded up.
pub(crate) fn schedule_quantity(schedule: &Schedule) -> Result<u32, ParseError> {
    ceil_positive(raw_units(schedule))
}

/// Quantity for a concrete drug, dispatched on its dispensing category.
pub(crate) fn dispense_quantity(
    schedule: &Schedule,
    drug: &DrugDescriptor,
) -> Result<u32, ParseError> {
    // "This many, right now": STAT and unbounded PRN quantities are taken
    // verbatim for every category.
    if matches!(
        schedule,
        Schedule::Stat { .. } | Schedule::Prn { bound: None, .. }
    ) {
        return schedule_quantity(schedule);
    }

    // A patch-change count is already a final unit count, whatever the form.
    if matches!(schedule, Schedule::Patch { .. }) {
        return schedule_quantity(schedule);
    }

    if let Schedule::Topical { units } = schedule {
        return ceil_positive(f64::from(*units));
    }

    match drug.category() {
        DispensingCategory::Piece | DispensingCategory::Patch => schedule_quantity(schedule),

        DispensingCategory::Fixed | DispensingCategory::Drops => {
            if matches!(schedule, Schedule::SplitDose { .. }) {
                return Err(ParseError::UnsupportedCombination {
                    form: drug.form.as_str().to_string(),
                });
            }
            Ok(1)
        }

        DispensingCategory::Volume => {
            if matches!(schedule, Schedule::SplitDose { .. }) {
                return Err(ParseError::UnsupportedCombination {
                    form: drug.form.as_str().to_string(),
                });
            }
            let bottle_size = drug
                .bottle_size_ml
                .filter(|size| *size > 0.0)
                .ok_or_else(|| ParseError::MissingBottleSize {
                    form: drug.form.as_str().to_string(),
                })?;
            ceil_positive(raw_units(schedule) / bottle_size)
        }
    }
}
