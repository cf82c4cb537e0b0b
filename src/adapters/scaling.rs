//! Numerical scaler for age, height and weight.
//!
//! Parameters are the fitted per-feature attributes of the training-time
//! scaler. Each output component depends only on its own input component.

use serde::{Deserialize, Serialize};

use crate::domain::{ScaledMeasurements, NUMERICAL_FEATURE_COUNT};

type Params = [f64; NUMERICAL_FEATURE_COUNT];

/// Fitted scaling parameters, tagged by scaler family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    /// Standard scaling: `(x - mean) / scale`
    Standard { mean: Params, scale: Params },
    /// Min-max scaling as exported: `x * scale + min`
    MinMax { min: Params, scale: Params },
    /// Robust scaling: `(x - center) / scale`
    Robust { center: Params, scale: Params },
}

/// Fitted numerical scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalScaler {
    /// Column names seen at fit time (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,

    #[serde(flatten)]
    params: ScalerParams,
}

impl NumericalScaler {
    /// Build a scaler from its parameters.
    ///
    /// # Errors
    /// Returns an error for non-finite parameters or a zero divisor.
    pub fn new(params: ScalerParams) -> Result<Self, String> {
        let scaler = Self {
            feature_names: None,
            params,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Parse and validate an exported scaler.
    ///
    /// # Errors
    /// Returns a description of the parse or validation failure.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        let scaler: Self =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid scaler JSON: {e}"))?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(names) = &self.feature_names {
            if names.len() != NUMERICAL_FEATURE_COUNT {
                return Err(format!(
                    "scaler fitted on {} features, expected {NUMERICAL_FEATURE_COUNT}",
                    names.len()
                ));
            }
        }

        let (offset, scale, divides) = match &self.params {
            ScalerParams::Standard { mean, scale } => (mean, scale, true),
            ScalerParams::MinMax { min, scale } => (min, scale, false),
            ScalerParams::Robust { center, scale } => (center, scale, true),
        };
        if offset.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err("scaler parameters must be finite".into());
        }
        if divides {
            if let Some(i) = scale.iter().position(|&s| s == 0.0) {
                return Err(format!("scaler scale for feature {i} is zero"));
            }
        }
        Ok(())
    }

    /// Scaler family name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.params {
            ScalerParams::Standard { .. } => "standard",
            ScalerParams::MinMax { .. } => "min_max",
            ScalerParams::Robust { .. } => "robust",
        }
    }

    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Scale `[age, height, weight]` as one sample.
    #[must_use]
    pub fn transform(&self, values: Params) -> ScaledMeasurements {
        let mut out = [0.0; NUMERICAL_FEATURE_COUNT];
        for (i, (o, x)) in out.iter_mut().zip(values).enumerate() {
            *o = match &self.params {
                ScalerParams::Standard { mean, scale } => (x - mean[i]) / scale[i],
                ScalerParams::MinMax { min, scale } => x * scale[i] + min[i],
                ScalerParams::Robust { center, scale } => (x - center[i]) / scale[i],
            };
        }
        ScaledMeasurements::from_array(out)
    }
}
