//! The fixed risk-factor catalog.
//!
//! Twelve binary lifestyle/clinical questions accompany every image submission.
//! Each factor has a stable lower-case identifier, used both as the UI key and as
//! the key inside the `feature_score` payload, and a human-readable label.
//!
//! The diagnosis service must honour exactly these identifiers, so the catalog is
//! a closed `enum` rather than a runtime table: an identifier outside the catalog
//! cannot be constructed, and string input is checked once when it is parsed.

use crate::error::ScreeningError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskFactor {
    DrinkAlcohol,
    Smoking,
    ChewBetelNut,
    EatSpicyFood,
    CanBeWipedOff,
    NoSymptoms,
    ItAlwaysHurts,
    OralInjury,
    ImmuneDeficiency,
    Immunosuppression,
    UseSteroidMedication,
    OralHealthProblems,
}

impl RiskFactor {
    /// Every factor, in the order the form presents them and the payload lists them.
    pub const ALL: [RiskFactor; 12] = [
        RiskFactor::DrinkAlcohol,
        RiskFactor::Smoking,
        RiskFactor::ChewBetelNut,
        RiskFactor::EatSpicyFood,
        RiskFactor::CanBeWipedOff,
        RiskFactor::NoSymptoms,
        RiskFactor::ItAlwaysHurts,
        RiskFactor::OralInjury,
        RiskFactor::ImmuneDeficiency,
        RiskFactor::Immunosuppression,
        RiskFactor::UseSteroidMedication,
        RiskFactor::OralHealthProblems,
    ];

    /// Wire identifier, as sent in `feature_score`.
    pub const fn id(self) -> &'static str {
        match self {
            RiskFactor::DrinkAlcohol => "drink alcohol",
            RiskFactor::Smoking => "smoking",
            RiskFactor::ChewBetelNut => "chew betel nut",
            RiskFactor::EatSpicyFood => "eat spicy food",
            RiskFactor::CanBeWipedOff => "can be wiped off",
            RiskFactor::NoSymptoms => "no symptoms",
            RiskFactor::ItAlwaysHurts => "it always hurts",
            RiskFactor::OralInjury => "oral injury",
            RiskFactor::ImmuneDeficiency => "immune deficiency",
            RiskFactor::Immunosuppression => "immunosuppression",
            RiskFactor::UseSteroidMedication => "use steroid medication",
            RiskFactor::OralHealthProblems => "oral health problems",
        }
    }

    /// Label shown next to the question.
    pub const fn display_label(self) -> &'static str {
        match self {
            RiskFactor::DrinkAlcohol => "Alcohol Consumption",
            RiskFactor::Smoking => "Smoking",
            RiskFactor::ChewBetelNut => "Chew Betel Nut",
            RiskFactor::EatSpicyFood => "Spicy Food Consumption",
            RiskFactor::CanBeWipedOff => "Lesion Can Be Wiped Off",
            RiskFactor::NoSymptoms => "No Symptoms",
            RiskFactor::ItAlwaysHurts => "Persistent Pain",
            RiskFactor::OralInjury => "Oral Injury",
            RiskFactor::ImmuneDeficiency => "Immune Deficiency",
            RiskFactor::Immunosuppression => "Immunosuppression",
            RiskFactor::UseSteroidMedication => "Steroid Medication Use",
            RiskFactor::OralHealthProblems => "Existing Oral Health Problems",
        }
    }
}

impl std::str::FromStr for RiskFactor {
    type Err = ScreeningError;

    /// Parses a wire identifier. Matching ignores case and surrounding whitespace,
    /// and accepts `-`/`_` in place of spaces so identifiers can be typed on a
    /// command line (`chew-betel-nut`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace(['-', '_'], " ");
        RiskFactor::ALL
            .into_iter()
            .find(|factor| factor.id() == normalised)
            .ok_or_else(|| ScreeningError::UnknownRiskFactor(s.to_owned()))
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
