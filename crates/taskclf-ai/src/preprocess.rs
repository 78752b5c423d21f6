//! Column preprocessing: standardised token count plus one-hot categoricals.
//!
//! Every statistic is fitted on the training partition only. Categories not
//! seen during fitting encode as all zeros.

use serde::{Deserialize, Serialize};

use crate::features::FeatureRecord;

/// Zero-mean, unit-variance scaling of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    /// Population standard deviation; 1.0 when the column is constant.
    pub scale: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                scale: 1.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        Self {
            mean,
            scale: if std > f64::EPSILON { std } else { 1.0 },
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// One-hot encoding over categories learned at fit time, sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort_unstable();
        categories.dedup();
        Self { categories }
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Append the encoding of `value` to `out`. Unknown values append zeros.
    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let hit = self.categories.binary_search_by(|c| c.as_str().cmp(value)).ok();
        out.extend((0..self.categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
    }
}

fn flag(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// Fitted column transformer for [`FeatureRecord`]s.
///
/// Output layout: `[token_count_scaled, source.., has_question.., has_trigger..]`.
/// The raw text column is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub token_count: StandardScaler,
    pub source: OneHotEncoder,
    pub has_question: OneHotEncoder,
    pub has_trigger: OneHotEncoder,
}

impl Preprocessor {
    pub fn fit(rows: &[&FeatureRecord]) -> Self {
        let counts: Vec<f64> = rows.iter().map(|r| f64::from(r.token_count)).collect();
        Self {
            token_count: StandardScaler::fit(&counts),
            source: OneHotEncoder::fit(rows.iter().map(|r| r.source.as_str())),
            has_question: OneHotEncoder::fit(rows.iter().map(|r| flag(r.has_question))),
            has_trigger: OneHotEncoder::fit(rows.iter().map(|r| flag(r.has_trigger))),
        }
    }

    /// Width of the transformed feature vector.
    pub fn width(&self) -> usize {
        1 + self.source.width() + self.has_question.width() + self.has_trigger.width()
    }

    pub fn transform(&self, row: &FeatureRecord) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        out.push(self.token_count.transform(f64::from(row.token_count)));
        self.source.encode_into(&row.source, &mut out);
        self.has_question.encode_into(flag(row.has_question), &mut out);
        self.has_trigger.encode_into(flag(row.has_trigger), &mut out);
        out
    }

    pub fn transform_all(&self, rows: &[&FeatureRecord]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
