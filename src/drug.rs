//! Drug descriptor types and the form → dispensing-category table.
//!
//! The quantity formulas dispatch on [`DispensingCategory`], which is derived
//! from the drug's physical form, never from `unit_type`; unit type is
//! catalog metadata and can disagree with the form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for string values that do not map to a known enum variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {field} value: '{value}'")]
pub struct UnknownVariant {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(UnknownVariant {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DrugForm {
    Tablet => "tablet",
    Capsule => "capsule",
    Syrup => "syrup",
    Suspension => "suspension",
    Solution => "solution",
    Patch => "patch",
    Cream => "cream",
    Ointment => "ointment",
    Gel => "gel",
    Lotion => "lotion",
    Drops => "drops",
    Inhaler => "inhaler",
    CombinationPack => "combination_pack",
    Suppository => "suppository",
    Sachet => "sachet",
    Vial => "vial",
    Lozenge => "lozenge",
    Pessary => "pessary",
    Enema => "enema",
    IvBag => "iv_bag",
    Injection => "injection",
});

str_enum!(UnitType {
    Piece => "piece",
    Bottle => "bottle",
    Tube => "tube",
    Device => "device",
    Pack => "pack",
});

/// The quantity-formula family a drug's physical form belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispensingCategory {
    /// Counted items: quantity = dose × times-per-day × days, rounded up.
    Piece,
    /// Millilitre doses dispensed as whole bottles.
    Volume,
    /// Always one unit (tubes, inhalers, packs) regardless of schedule.
    Fixed,
    /// Always one bottle; the leading number is drops per application.
    Drops,
    /// Transdermal patches changed on a fixed day interval.
    Patch,
}

impl DrugForm {
    /// Static categorization table: every form maps to exactly one category.
    pub fn category(&self) -> DispensingCategory {
        match self {
            Self::Tablet
            | Self::Capsule
            | Self::Suppository
            | Self::Sachet
            | Self::Vial
            | Self::Lozenge
            | Self::Pessary
            | Self::Enema
            | Self::IvBag
            | Self::Injection => DispensingCategory::Piece,
            Self::Syrup | Self::Suspension | Self::Solution => DispensingCategory::Volume,
            Self::Cream
            | Self::Ointment
            | Self::Gel
            | Self::Lotion
            | Self::Inhaler
            | Self::CombinationPack => DispensingCategory::Fixed,
            Self::Drops => DispensingCategory::Drops,
            Self::Patch => DispensingCategory::Patch,
        }
    }

    /// Topical forms accept a bare tube count ("2 tubes") as input.
    pub fn is_topical(&self) -> bool {
        matches!(self, Self::Cream | Self::Ointment | Self::Gel | Self::Lotion)
    }

    /// Injectable forms are the only ones valid for the 0-12-24H schedule.
    pub fn is_injectable(&self) -> bool {
        matches!(self, Self::Injection | Self::IvBag)
    }
}

/// Read-only drug attributes supplied by the caller's catalog lookup.
///
/// `bottle_size_ml` must be present and positive exactly when the form's
/// category is [`DispensingCategory::Volume`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugDescriptor {
    pub form: DrugForm,
    pub unit_type: UnitType,
    pub bottle_size_ml: Option<f64>,
}

impl DrugDescriptor {
    pub fn new(form: DrugForm, unit_type: UnitType) -> Self {
        Self {
            form,
            unit_type,
            bottle_size_ml: None,
        }
    }

    pub fn with_bottle_size(form: DrugForm, unit_type: UnitType, bottle_size_ml: f64) -> Self {
        Self {
            form,
            unit_type,
            bottle_size_ml: Some(bottle_size_ml),
        }
    }

    pub fn category(&self) -> DispensingCategory {
        self.form.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn every_piece_form_maps_to_piece_category() {
        for form in [
            DrugForm::Tablet,
            DrugForm::Capsule,
            DrugForm::Suppository,
            DrugForm::Sachet,
            DrugForm::Vial,
            DrugForm::Lozenge,
            DrugForm::Pessary,
            DrugForm::Enema,
            DrugForm::IvBag,
            DrugForm::Injection,
        ] {
            assert_eq!(form.category(), DispensingCategory::Piece, "{form:?}");
        }
    }

    #[test]
    fn liquids_are_volume_based() {
        assert_eq!(DrugForm::Syrup.category(), DispensingCategory::Volume);
        assert_eq!(DrugForm::Suspension.category(), DispensingCategory::Volume);
        assert_eq!(DrugForm::Solution.category(), DispensingCategory::Volume);
    }

    #[test]
    fn drops_and_patch_have_their_own_categories() {
        assert_eq!(DrugForm::Drops.category(), DispensingCategory::Drops);
        assert_eq!(DrugForm::Patch.category(), DispensingCategory::Patch);
    }

    #[test]
    fn topicals_and_devices_are_fixed_unit() {
        for form in [
            DrugForm::Cream,
            DrugForm::Ointment,
            DrugForm::Gel,
            DrugForm::Lotion,
            DrugForm::Inhaler,
            DrugForm::CombinationPack,
        ] {
            assert_eq!(form.category(), DispensingCategory::Fixed, "{form:?}");
        }
    }

    #[test]
    fn form_round_trips_through_strings() {
        let form = DrugForm::from_str("combination_pack").unwrap();
        assert_eq!(form, DrugForm::CombinationPack);
        assert_eq!(form.as_str(), "combination_pack");

        assert!(DrugForm::from_str("hologram").is_err());
    }

    #[test]
    fn injectable_forms() {
        assert!(DrugForm::Injection.is_injectable());
        assert!(DrugForm::IvBag.is_injectable());
        assert!(!DrugForm::Tablet.is_injectable());
    }
}
