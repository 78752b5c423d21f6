//! Evaluation records shared by the trainer and the report artifacts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Precision/recall/F1 for one class, or an average across classes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Full classification report for one axis on its held-out partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// class label → metrics, for every class seen in truth or predictions
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

/// One line of the metrics report: an axis and its weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisReportRow {
    pub axis: String,
    #[serde(flatten)]
    pub metrics: ClassMetrics,
}

impl AxisReportRow {
    pub fn from_report(axis: &str, report: &ClassificationReport) -> Self {
        Self {
            axis: axis.to_string(),
            metrics: report.weighted_avg,
        }
    }
}
