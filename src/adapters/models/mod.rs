//! Classifier artifacts exported from the training pipeline.
//!
//! The classifier file is a JSON object tagged by `kind`:
//! - `decision_tree`: flat tree arrays
//! - `random_forest`: a list of flat tree arrays
//! - `logistic_regression`: coefficient rows and intercepts

mod linear;
mod tree;

use serde::{Deserialize, Serialize};

use crate::ports::Classifier;

pub use linear::LogisticRegression;
pub use tree::{DecisionTree, RandomForest, TreeArrays};

/// Exported classifier, tagged by model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ClassifierArtifact {
    /// Parse an exported classifier.
    ///
    /// # Errors
    /// Returns a description of the parse failure.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        serde_json::from_slice(bytes).map_err(|e| format!("invalid classifier JSON: {e}"))
    }

    /// Validate the exported structure and hand it out behind the port.
    ///
    /// # Errors
    /// Returns a description of the first structural problem found.
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, String> {
        match self {
            Self::DecisionTree(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
            Self::RandomForest(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
            Self::LogisticRegression(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
        }
    }
}
