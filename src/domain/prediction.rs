//! Prediction output.

use serde::{Deserialize, Serialize};

/// Decoded classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable nutritional status, e.g. "Stunted"
    pub label: String,

    /// Class label emitted by the classifier before decoding
    pub class_index: i64,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (class {})", self.label, self.class_index)
    }
}
