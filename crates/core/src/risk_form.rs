//! Risk form model.
//!
//! Holds the user's answers to the fixed risk-factor catalog. Every factor starts as
//! [`Answer::No`], answers are merged one factor at a time, and a snapshot always
//! covers the whole catalog so the payload never depends on which questions the
//! user happened to touch.
//!
//! Gating (the form is read-only until an image exists) is enforced by
//! [`ScreeningFlow`](crate::ScreeningFlow), which owns the form.

use crate::catalog::RiskFactor;
use crate::{ScreeningError, ScreeningResult};
use oralscan_types::Answer;
use serde::ser::SerializeMap;
use std::collections::{BTreeMap, HashMap};

/// Mutable answer set for one screening session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskForm {
    answers: HashMap<RiskFactor, Answer>,
}

impl RiskForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the answer for one factor, leaving every other answer untouched.
    pub fn set_answer(&mut self, factor: RiskFactor, answer: Answer) {
        match answer {
            // Unset and No are indistinguishable on the wire; keep the map sparse.
            Answer::No => {
                self.answers.remove(&factor);
            }
            Answer::Yes => {
                self.answers.insert(factor, answer);
            }
        }
    }

    /// Current answer for `factor`, defaulting to `No`.
    pub fn answer(&self, factor: RiskFactor) -> Answer {
        self.answers.get(&factor).copied().unwrap_or_default()
    }

    /// Returns every answer back to `No`.
    pub fn reset(&mut self) {
        self.answers.clear();
    }

    /// Full answer set covering every catalog factor.
    pub fn snapshot(&self) -> RiskAnswers {
        RiskAnswers {
            answers: RiskFactor::ALL.map(|factor| (factor, self.answer(factor))),
        }
    }

    /// Loads answers from a YAML mapping of factor identifier to answer.
    ///
    /// ```yaml
    /// smoking: yes
    /// drink alcohol: 1
    /// oral injury: false
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ScreeningError::YamlDeserialization` if the document is not a mapping
    /// of strings to answers, and `ScreeningError::UnknownRiskFactor` for a key outside
    /// the catalog.
    pub fn from_yaml(document: &str) -> ScreeningResult<Self> {
        if document.trim().is_empty() {
            return Ok(Self::new());
        }

        let raw: Option<BTreeMap<String, Answer>> =
            serde_yaml::from_str(document).map_err(ScreeningError::YamlDeserialization)?;

        let mut form = Self::new();
        for (key, answer) in raw.unwrap_or_default() {
            let factor: RiskFactor = key.parse()?;
            form.set_answer(factor, answer);
        }
        Ok(form)
    }
}

/// Immutable, complete answer set: exactly one entry per catalog factor, in catalog order.
///
/// Serialises to the JSON object sent as `feature_score`, e.g.
/// `{"drink alcohol":0,"smoking":1,...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAnswers {
    answers: [(RiskFactor, Answer); 12],
}

impl RiskAnswers {
    pub fn iter(&self) -> impl Iterator<Item = (RiskFactor, Answer)> + '_ {
        self.answers.iter().copied()
    }

    pub fn get(&self, factor: RiskFactor) -> Answer {
        self.iter()
            .find(|(f, _)| *f == factor)
            .map(|(_, answer)| answer)
            .unwrap_or_default()
    }

    /// Number of factors answered `Yes`.
    pub fn positive_count(&self) -> usize {
        self.iter().filter(|(_, answer)| answer.is_yes()).count()
    }

    /// JSON text for the `feature_score` multipart field.
    pub fn to_feature_score_json(&self) -> ScreeningResult<String> {
        serde_json::to_string(self).map_err(ScreeningError::Serialization)
    }
}

impl serde::Serialize for RiskAnswers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.answers.len()))?;
        for (factor, answer) in self.iter() {
            map.serialize_entry(factor.id(), &answer)?;
        }
        map.end()
    }
}
