//! Logistic regression classifier.

use serde::{Deserialize, Serialize};

use super::tree::argmax;
use crate::domain::FeatureVector;
use crate::ports::{check_input, Classifier, ClassifierError};

/// Fitted logistic regression.
///
/// Binary models carry a single coefficient row; the positive class wins when
/// the decision value is strictly positive. Multiclass models carry one row
/// per class and the largest decision value wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    /// # Errors
    /// Returns a description of the first shape problem found.
    pub fn validate(&self) -> Result<(), String> {
        let n_classes = self.classes.len();
        if n_classes < 2 {
            return Err("logistic regression needs at least two classes".into());
        }
        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if self.coef.len() != expected_rows || self.intercept.len() != expected_rows {
            return Err(format!(
                "expected {expected_rows} coefficient rows for {n_classes} classes, got {}",
                self.coef.len()
            ));
        }
        let width = self.coef[0].len();
        if width == 0 || self.coef.iter().any(|row| row.len() != width) {
            return Err("coefficient rows must be non-empty and equal length".into());
        }
        if self
            .coef
            .iter()
            .flatten()
            .chain(self.intercept.iter())
            .any(|v| !v.is_finite())
        {
            return Err("coefficients must be finite".into());
        }
        Ok(())
    }

    /// Raw decision values, one per coefficient row.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the input does not fit the model.
    pub fn decision_function(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        let x = features.as_slice();
        check_input(x, self.n_features())?;
        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + b)
            .collect())
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
        let scores = self.decision_function(features)?;
        let idx = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };
        Ok(self.classes[idx])
    }
}
