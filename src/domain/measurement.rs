//! Child measurement input types.
//!
//! The wire format keeps the keys used by the existing frontend
//! (`jenis_kelamin`, `umur`, `tinggi`, `berat`); English aliases are accepted
//! for API clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PredictionError;

/// A required request field, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Sex of the child (categorical)
    Sex,
    /// Age in months
    Age,
    /// Height in centimetres
    Height,
    /// Weight in kilograms
    Weight,
}

impl Field {
    /// All fields in the order they are validated.
    pub const ALL: [Field; 4] = [Field::Sex, Field::Age, Field::Height, Field::Weight];

    /// Primary JSON key.
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Sex => "jenis_kelamin",
            Self::Age => "umur",
            Self::Height => "tinggi",
            Self::Weight => "berat",
        }
    }

    /// Secondary JSON key accepted in place of the primary one.
    #[must_use]
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Sex => "sex",
            Self::Age => "age_months",
            Self::Height => "height_cm",
            Self::Weight => "weight_kg",
        }
    }

    /// Comma-separated list of the primary keys, for error messages.
    #[must_use]
    pub fn required_keys() -> String {
        Self::ALL
            .iter()
            .map(|f| format!("'{}'", f.wire_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Raw request as received at the boundary.
///
/// Every field is optional here; presence is checked by [`RawRequest::validate`],
/// which is the first step of the prediction pipeline. Parsing goes through
/// [`RawRequest::from_value`]: each field is read from its primary key, then
/// its alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    pub sex: Option<String>,
    pub age_months: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl RawRequest {
    /// Parse a request from raw JSON bytes.
    ///
    /// Absent keys and `null` values become `None`. A present value of the
    /// wrong JSON type is rejected here, naming the key.
    ///
    /// # Errors
    /// Returns `PredictionError::Processing` for malformed JSON, a non-object
    /// body, or a field of the wrong type.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, PredictionError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| PredictionError::Processing(format!("Invalid JSON body: {e}")))?;
        Self::from_value(&value)
    }

    /// Build a request from an already-parsed JSON value.
    ///
    /// # Errors
    /// See [`RawRequest::from_json_slice`].
    pub fn from_value(value: &Value) -> Result<Self, PredictionError> {
        let obj = value.as_object().ok_or_else(|| {
            PredictionError::Processing(format!(
                "Request body must be a JSON object with keys {}",
                Field::required_keys()
            ))
        })?;

        let sex = match lookup(obj, Field::Sex) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => return Err(type_error(Field::Sex, "a string", other)),
        };

        Ok(Self {
            sex,
            age_months: number(obj, Field::Age)?,
            height_cm: number(obj, Field::Height)?,
            weight_kg: number(obj, Field::Weight)?,
        })
    }

    /// Check that every required field is present.
    ///
    /// Fields are checked in canonical order and the first missing one is
    /// reported.
    ///
    /// # Errors
    /// Returns `PredictionError::MissingField` naming the first absent field.
    pub fn validate(&self) -> Result<ChildMeasurement, PredictionError> {
        let sex = self
            .sex
            .clone()
            .ok_or(PredictionError::MissingField(Field::Sex))?;
        let age_months = self
            .age_months
            .ok_or(PredictionError::MissingField(Field::Age))?;
        let height_cm = self
            .height_cm
            .ok_or(PredictionError::MissingField(Field::Height))?;
        let weight_kg = self
            .weight_kg
            .ok_or(PredictionError::MissingField(Field::Weight))?;

        Ok(ChildMeasurement {
            sex,
            age_months,
            height_cm,
            weight_kg,
        })
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, field: Field) -> Option<&'a Value> {
    obj.get(field.wire_name())
        .or_else(|| obj.get(field.alias()))
        .filter(|v| !v.is_null())
}

fn number(obj: &Map<String, Value>, field: Field) -> Result<Option<f64>, PredictionError> {
    match lookup(obj, field) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| type_error(field, "a number", v)),
    }
}

fn type_error(field: Field, expected: &str, got: &Value) -> PredictionError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    PredictionError::Processing(format!(
        "Invalid value for '{}': expected {expected}, got {got}",
        field.wire_name()
    ))
}

/// A request that passed the presence check.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildMeasurement {
    /// Sex label, exactly as supplied
    pub sex: String,

    /// Age in months
    pub age_months: f64,

    /// Height in cm
    pub height_cm: f64,

    /// Weight in kg
    pub weight_kg: f64,
}

impl ChildMeasurement {
    /// Numerical features in the order the scaler was fitted on:
    /// age, height, weight.
    #[must_use]
    pub fn numerical(&self) -> [f64; 3] {
        [self.age_months, self.height_cm, self.weight_kg]
    }
}
