//! Validated value types shared across the oral screening crates.
//!
//! Each type here guarantees its invariant once constructed, so the rest of the
//! workspace can pass them around without re-checking:
//!
//! - [`Answer`]: a binary risk-factor answer that travels on the wire as `0` or `1`
//! - [`Percentage`]: a chart value on the `[0, 100]` scale, rounded to one decimal place
//! - [`ImageBytes`]: a non-empty image payload

use std::fmt;

/// Errors that can occur when creating validated types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// An image payload contained no bytes
    #[error("image payload cannot be empty")]
    EmptyImage,

    /// The input could not be read as a yes/no answer
    #[error("invalid answer '{0}' (expected 0/1, yes/no, y/n or true/false)")]
    InvalidAnswer(String),
}

/// A binary answer to a single risk-factor question.
///
/// Serialises as the integer `0` or `1`, which is the form the diagnosis service
/// expects inside `feature_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Answer {
    /// The factor does not apply. This is the default for unanswered factors.
    #[default]
    No,
    /// The factor applies.
    Yes,
}

impl Answer {
    /// Returns the wire value (`0` or `1`).
    pub fn as_u8(self) -> u8 {
        match self {
            Answer::No => 0,
            Answer::Yes => 1,
        }
    }

    /// Builds an answer from a wire value. Anything other than `0` or `1` is rejected.
    pub fn from_u8(value: u8) -> Result<Self, TypesError> {
        match value {
            0 => Ok(Answer::No),
            1 => Ok(Answer::Yes),
            other => Err(TypesError::InvalidAnswer(other.to_string())),
        }
    }

    pub fn is_yes(self) -> bool {
        matches!(self, Answer::Yes)
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}

impl std::str::FromStr for Answer {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "y" | "true" => Ok(Answer::Yes),
            "0" | "no" | "n" | "false" => Ok(Answer::No),
            _ => Err(TypesError::InvalidAnswer(s.to_owned())),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::No => write!(f, "No"),
            Answer::Yes => write!(f, "Yes"),
        }
    }
}

impl serde::Serialize for Answer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> serde::Deserialize<'de> for Answer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AnswerVisitor;

        impl serde::de::Visitor<'_> for AnswerVisitor {
            type Value = Answer;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("0, 1, a boolean, or yes/no")
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Answer, E> {
                Ok(Answer::from(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Answer, E> {
                match v {
                    0 => Ok(Answer::No),
                    1 => Ok(Answer::Yes),
                    other => Err(E::custom(TypesError::InvalidAnswer(other.to_string()))),
                }
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Answer, E> {
                match v {
                    0 => Ok(Answer::No),
                    1 => Ok(Answer::Yes),
                    other => Err(E::custom(TypesError::InvalidAnswer(other.to_string()))),
                }
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Answer, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AnswerVisitor)
    }
}

/// A chart value on the percentage scale.
///
/// Built from a fraction (`0.42` becomes `42.0`), rounded to exactly one decimal
/// place and clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Percentage {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Converts a fraction in `[0, 1]` to a percentage rounded to one decimal place.
    ///
    /// Non-finite input maps to `0.0`.
    pub fn from_fraction(fraction: f64) -> Self {
        if !fraction.is_finite() {
            return Self(Self::MIN);
        }
        let tenths = (fraction * 1000.0).round();
        Self((tenths / 10.0).clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

/// A non-empty image payload.
///
/// No format validation is performed: any bytes purporting to be an image are
/// accepted, and the diagnosis service is the authority on whether they decode.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBytes(Vec<u8>);

impl ImageBytes {
    /// Wraps the given bytes, rejecting an empty payload.
    pub fn new(bytes: Vec<u8>) -> Result<Self, TypesError> {
        if bytes.is_empty() {
            return Err(TypesError::EmptyImage);
        }
        Ok(Self(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBytes({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for ImageBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(Percentage::from_fraction(0.1234).value(), 12.3);
        assert_eq!(Percentage::from_fraction(0.42).value(), 42.0);
        assert_eq!(Percentage::from_fraction(0.77).value(), 77.0);
        assert_eq!(Percentage::from_fraction(0.8766).value(), 87.7);
    }

    #[test]
    fn test_percentage_clamps_out_of_range_values() {
        assert_eq!(Percentage::from_fraction(-0.2).value(), 0.0);
        assert_eq!(Percentage::from_fraction(1.5).value(), 100.0);
        assert_eq!(Percentage::from_fraction(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_percentage_display_shows_one_decimal() {
        assert_eq!(Percentage::from_fraction(0.42).to_string(), "42.0%");
        assert_eq!(Percentage::from_fraction(0.1234).to_string(), "12.3%");
    }

    #[test]
    fn test_answer_parses_common_spellings() {
        for yes in ["1", "yes", "Y", "TRUE", " yes "] {
            assert_eq!(yes.parse::<Answer>().unwrap(), Answer::Yes, "input {yes:?}");
        }
        for no in ["0", "no", "N", "false"] {
            assert_eq!(no.parse::<Answer>().unwrap(), Answer::No, "input {no:?}");
        }
        assert!(matches!(
            "maybe".parse::<Answer>(),
            Err(TypesError::InvalidAnswer(_))
        ));
    }

    #[test]
    fn test_answer_serialises_as_integer() {
        assert_eq!(serde_json::to_string(&Answer::Yes).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Answer::No).unwrap(), "0");
    }

    #[test]
    fn test_answer_deserialises_from_integers_bools_and_strings() {
        let parsed: Vec<Answer> = serde_json::from_str(r#"[1, 0, true, false, "yes"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Answer::Yes, Answer::No, Answer::Yes, Answer::No, Answer::Yes]
        );
        assert!(serde_json::from_str::<Answer>("2").is_err());
    }

    #[test]
    fn test_answer_from_u8_rejects_other_values() {
        assert_eq!(Answer::from_u8(1).unwrap(), Answer::Yes);
        assert!(Answer::from_u8(7).is_err());
    }

    #[test]
    fn test_image_bytes_rejects_empty_payload() {
        assert!(matches!(
            ImageBytes::new(Vec::new()),
            Err(TypesError::EmptyImage)
        ));
        let bytes = ImageBytes::new(vec![0xff, 0xd8]).unwrap();
        assert_eq!(bytes.len(), 2);
        assert_eq!(format!("{bytes:?}"), "ImageBytes(2 bytes)");
    }
}
