//! Classifier port: the opaque model behind the pipeline.
//!
//! The pipeline only relies on "same vector in, same class out". Swapping the
//! model format means adding an implementation, not touching the pipeline.

use crate::domain::FeatureVector;

/// Error raised by a classifier implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Non-finite feature value at column {0}")]
    NonFinite(usize),

    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}

/// Trait for a pre-fitted classifier.
///
/// Implementations must be pure: no caching or scratch state that could make
/// concurrent calls interfere.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Short model family name, e.g. "decision_tree".
    fn kind(&self) -> &'static str;

    /// Number of input columns the model was fitted on.
    fn n_features(&self) -> usize;

    /// Class labels the model can emit, in its internal order.
    fn classes(&self) -> &[i64];

    /// Predict the class label for a single sample.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the input does not fit the model.
    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError>;
}

/// Check a feature slice against a model's expected width and finiteness.
///
/// # Errors
/// Returns the first violation found.
pub fn check_input(features: &[f64], n_features: usize) -> Result<(), ClassifierError> {
    if features.len() != n_features {
        return Err(ClassifierError::FeatureCount {
            expected: n_features,
            got: features.len(),
        });
    }
    match features.iter().position(|v| !v.is_finite()) {
        Some(col) => Err(ClassifierError::NonFinite(col)),
        None => Ok(()),
    }
}
