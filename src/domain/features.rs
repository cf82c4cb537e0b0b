//! Classifier input vector.

use serde::{Deserialize, Serialize};

/// Number of numerical features passed through the scaler.
pub const NUMERICAL_FEATURE_COUNT: usize = 3;

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 4;

/// Feature names in classifier column order.
///
/// The classifier was fitted on exactly this order. Reordering does not fail,
/// it silently produces wrong predictions.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["jenis_kelamin", "umur", "tinggi", "berat"];

/// Output of the numerical scaler: age, height, weight, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledMeasurements {
    pub age: f64,
    pub height: f64,
    pub weight: f64,
}

impl ScaledMeasurements {
    #[must_use]
    pub fn from_array(values: [f64; NUMERICAL_FEATURE_COUNT]) -> Self {
        let [age, height, weight] = values;
        Self {
            age,
            height,
            weight,
        }
    }
}

/// Assembled feature vector `[sex_code, age_scaled, height_scaled, weight_scaled]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Assemble the classifier input from the encoded sex and scaled measurements.
    #[must_use]
    pub fn assemble(sex_code: usize, scaled: ScaledMeasurements) -> Self {
        Self([sex_code as f64, scaled.age, scaled.height, scaled.weight])
    }

    /// Wrap a raw vector already in classifier column order.
    #[must_use]
    pub fn from_raw(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// True when every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}
