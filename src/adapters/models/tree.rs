//! Decision tree and random forest classifiers.
//!
//! Trees use the flat array layout of a fitted tree: node `i` splits on
//! `feature[i]` at `threshold[i]`, going left when `x <= threshold`. Leaves
//! have `-1` in both child arrays. `value[i]` holds per-class weights.
//!
//! Fitted trees see their input as `f32`, so features are rounded to `f32`
//! before each comparison with the `f64` threshold.

use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;
use crate::ports::{check_input, Classifier, ClassifierError};

const LEAF: i64 = -1;

/// Exported tree structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl TreeArrays {
    fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    /// Structural checks so traversal can never index out of bounds or loop.
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree arrays have different lengths".into());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                let weights = &self.value[node];
                if weights.len() != n_classes {
                    return Err(format!(
                        "leaf {node} has {} class weights, expected {n_classes}",
                        weights.len()
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(format!("leaf {node} has invalid class weights"));
                }
                continue;
            }
            // Children always come after their parent, which rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let f = self.feature[node];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {node} splits on invalid feature {f}"));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    fn leaf_for(&self, x: &[f64]) -> usize {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return node;
            }
            let f = self.feature[node] as usize;
            node = if f64::from(x[f] as f32) <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }

    /// Class distribution at the leaf reached by `x`, normalized to sum to 1.
    fn proba(&self, x: &[f64]) -> Vec<f64> {
        let weights = &self.value[self.leaf_for(x)];
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            weights.clone()
        }
    }
}

/// Index of the largest value; the first one wins ties.
pub(super) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Single decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features_in: usize,
    pub classes: Vec<i64>,
    #[serde(flatten)]
    pub tree: TreeArrays,
}

impl DecisionTree {
    /// # Errors
    /// Returns a description of the first structural problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("decision tree has no classes".into());
        }
        self.tree.validate(self.n_features_in, self.classes.len())
    }

    /// Class probabilities for one sample.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the input does not fit the model.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        check_input(features.as_slice(), self.n_features_in)?;
        Ok(self.tree.proba(features.as_slice()))
    }
}

impl Classifier for DecisionTree {
    fn kind(&self) -> &'static str {
        "decision_tree"
    }

    fn n_features(&self) -> usize {
        self.n_features_in
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes[argmax(&proba)])
    }
}

/// Random forest: the class with the highest mean leaf probability wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features_in: usize,
    pub classes: Vec<i64>,
    pub estimators: Vec<TreeArrays>,
}

impl RandomForest {
    /// # Errors
    /// Returns a description of the first structural problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("random forest has no classes".into());
        }
        if self.estimators.is_empty() {
            return Err("random forest has no estimators".into());
        }
        for (i, tree) in self.estimators.iter().enumerate() {
            tree.validate(self.n_features_in, self.classes.len())
                .map_err(|e| format!("estimator {i}: {e}"))?;
        }
        Ok(())
    }

    /// Mean class probabilities across all trees.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the input does not fit the model.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        let x = features.as_slice();
        check_input(x, self.n_features_in)?;

        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.estimators {
            for (acc, p) in sum.iter_mut().zip(tree.proba(x)) {
                *acc += p;
            }
        }
        let n = self.estimators.len() as f64;
        Ok(sum.into_iter().map(|s| s / n).collect())
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features_in
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes[argmax(&proba)])
    }
}
