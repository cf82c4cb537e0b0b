//! Label encoder: categorical string <-> integer code.
//!
//! Mirrors a fitted label encoder exported as `{"classes": [...]}`. The code
//! of a label is its position in `classes`. The same artifact shape serves as
//! the categorical encoder (sex) and the label decoder (nutritional status).

use serde::{Deserialize, Serialize};

use crate::domain::PredictionError;

/// Fitted label encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build an encoder from its fitted classes.
    ///
    /// # Errors
    /// Returns an error if the class list is empty, contains an empty label,
    /// or is not strictly ascending.
    pub fn new(classes: Vec<String>) -> Result<Self, String> {
        let encoder = Self { classes };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Parse and validate an exported encoder.
    ///
    /// # Errors
    /// Returns a description of the parse or validation failure.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        let encoder: Self =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid encoder JSON: {e}"))?;
        encoder.validate()?;
        Ok(encoder)
    }

    fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("encoder has no classes".into());
        }
        if let Some(pos) = self.classes.iter().position(|c| c.is_empty()) {
            return Err(format!("encoder class {pos} is an empty string"));
        }
        // A fitted encoder stores its vocabulary sorted, so codes follow it.
        for pair in self.classes.windows(2) {
            match pair[0].cmp(&pair[1]) {
                std::cmp::Ordering::Less => {}
                std::cmp::Ordering::Equal => {
                    return Err(format!("encoder class '{}' appears more than once", pair[0]));
                }
                std::cmp::Ordering::Greater => {
                    return Err(format!(
                        "encoder classes are not sorted: '{}' before '{}'",
                        pair[0], pair[1]
                    ));
                }
            }
        }
        Ok(())
    }

    /// Fitted vocabulary, in code order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode a label to its integer code. Matching is exact.
    ///
    /// # Errors
    /// Returns `PredictionError::UnknownCategory` for a label outside the
    /// fitted vocabulary.
    pub fn transform(&self, value: &str) -> Result<usize, PredictionError> {
        self.classes
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| PredictionError::UnknownCategory {
                value: value.to_string(),
                known: self.classes.clone(),
            })
    }

    /// Decode an integer code back to its label.
    ///
    /// # Errors
    /// Returns `PredictionError::Decode` when the code is negative or past
    /// the last class.
    pub fn inverse_transform(&self, code: i64) -> Result<&str, PredictionError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .ok_or(PredictionError::Decode(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sex_encoder() -> LabelEncoder {
        LabelEncoder::new(vec!["Laki-laki".into(), "Perempuan".into()]).expect("valid")
    }

    #[test]
    fn test_transform_known() {
        let enc = sex_encoder();
        assert_eq!(enc.transform("Laki-laki").unwrap(), 0);
        assert_eq!(enc.transform("Perempuan").unwrap(), 1);
    }

    #[test]
    fn test_transform_unknown_is_rejected() {
        let enc = sex_encoder();
        let err = enc.transform("invalid-value").unwrap_err();
        assert_eq!(
            err,
            PredictionError::UnknownCategory {
                value: "invalid-value".into(),
                known: vec!["Laki-laki".into(), "Perempuan".into()],
            }
        );
        // Matching is exact, no case folding.
        assert!(enc.transform("perempuan").is_err());
    }

    #[test]
    fn test_inverse_transform_bounds() {
        let enc = sex_encoder();
        assert_eq!(enc.inverse_transform(1).unwrap(), "Perempuan");
        assert_eq!(enc.inverse_transform(2), Err(PredictionError::Decode(2)));
        assert_eq!(enc.inverse_transform(-1), Err(PredictionError::Decode(-1)));
    }

    #[test]
    fn test_rejects_bad_fits() {
        assert!(LabelEncoder::new(vec![]).is_err());
        assert!(LabelEncoder::new(vec!["a".into(), "".into()]).is_err());
        assert!(LabelEncoder::new(vec!["a".into(), "a".into()]).is_err());
        let unsorted = LabelEncoder::new(vec!["Perempuan".into(), "Laki-laki".into()]);
        assert!(unsorted.unwrap_err().contains("not sorted"));
        assert!(LabelEncoder::from_json_slice(br#"{"classes": []}"#).is_err());
        assert!(LabelEncoder::from_json_slice(br#"{"labels": ["a"]}"#).is_err());
    }

    #[test]
    fn test_from_json() {
        let enc = LabelEncoder::from_json_slice(br#"{"classes": ["Normal", "Stunted"]}"#)
            .expect("valid");
        assert_eq!(enc.classes().len(), 2);
    }
}
