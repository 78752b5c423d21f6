//! Estimators over dense preprocessed feature vectors.
//!
//! Class labels are indices into the pipeline's sorted class list.

mod logistic;
mod tree;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskclf_core::EstimatorConfig;
use tracing::debug;

pub use logistic::LogisticRegression;
pub use tree::DecisionTree;

use crate::TrainError;

/// Which estimator to fit. Parsed from the configured `model_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    DecisionTree,
}

impl ModelKind {
    pub const SUPPORTED: &'static [&'static str] = &["logistic_regression", "decision_tree"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::DecisionTree => "decision_tree",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logistic_regression" => Ok(Self::LogisticRegression),
            "decision_tree" => Ok(Self::DecisionTree),
            other => Err(TrainError::UnsupportedModel(other.to_string())),
        }
    }
}

/// A classifier over dense feature rows.
pub trait Estimator {
    /// Fit on rows `x` with class indices `y` in `0..n_classes`.
    fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize);

    /// Predict the class index of one row.
    fn predict(&self, x: &[f64]) -> usize;
}

/// A fitted estimator of either kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
}

impl FittedModel {
    /// Fit a fresh estimator of `kind`.
    pub fn fit(
        kind: ModelKind,
        config: &EstimatorConfig,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
    ) -> Self {
        match kind {
            ModelKind::LogisticRegression => {
                let mut m = LogisticRegression::new(config);
                m.fit(x, y, n_classes);
                debug!(
                    rows = x.len(),
                    n_classes,
                    n_iter = m.n_iter(),
                    "fitted logistic regression"
                );
                Self::LogisticRegression(m)
            }
            ModelKind::DecisionTree => {
                let mut m = DecisionTree::new(config);
                m.fit(x, y, n_classes);
                debug!(
                    rows = x.len(),
                    n_classes,
                    depth = m.depth(),
                    nodes = m.nodes().len(),
                    "fitted decision tree"
                );
                Self::DecisionTree(m)
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::LogisticRegression(_) => ModelKind::LogisticRegression,
            Self::DecisionTree(_) => ModelKind::DecisionTree,
        }
    }

    pub fn predict(&self, x: &[f64]) -> usize {
        match self {
            Self::LogisticRegression(m) => m.predict(x),
            Self::DecisionTree(m) => m.predict(x),
        }
    }
}

/// Index of the largest value; ties go to the lowest index.
pub(crate) fn argmax<T: PartialOrd + Copy>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
