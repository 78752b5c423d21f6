//! Lexical feature extraction.
//!
//! One [`FeatureRecord`] per sample: token count, question mark, trigger word,
//! source tag, and the raw text. A [`FeatureFrame`] holds a batch of them as an
//! Arrow `RecordBatch` with the [`features`] schema.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, LargeStringArray, StringArray, UInt32Array};
use arrow::record_batch::RecordBatch;
use taskclf_core::{FeatureConfig, SampleRecord, features};

use crate::TrainError;

/// Derived per-sample attributes used for training.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub sample_id: String,
    pub source: String,
    pub token_count: u32,
    pub has_question: bool,
    pub has_trigger: bool,
    /// Raw query text, retained for text-based extractors.
    pub text: String,
}

/// Pure, deterministic sample → feature mapping.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    trigger: String,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::from_config(&FeatureConfig::default())
    }
}

impl FeatureBuilder {
    pub fn from_config(config: &FeatureConfig) -> Self {
        Self {
            trigger: config.trigger.to_lowercase(),
        }
    }

    pub fn build(&self, sample: &SampleRecord) -> FeatureRecord {
        let text = &sample.query;
        FeatureRecord {
            sample_id: sample.sample_id.clone(),
            source: sample.source.clone(),
            token_count: u32::try_from(sample.token_count()).unwrap_or(u32::MAX),
            has_question: text.contains('?'),
            has_trigger: !self.trigger.is_empty() && text.to_lowercase().contains(&self.trigger),
            text: text.clone(),
        }
    }
}

/// A batch of feature records backed by an Arrow `RecordBatch`.
pub struct FeatureFrame {
    batch: RecordBatch,
}

impl FeatureFrame {
    /// Build one row per sample, in sample order.
    pub fn from_samples(
        samples: &[SampleRecord],
        builder: &FeatureBuilder,
    ) -> Result<Self, TrainError> {
        let records: Vec<FeatureRecord> = samples.iter().map(|s| builder.build(s)).collect();
        Self::from_records(&records)
    }

    pub fn from_records(records: &[FeatureRecord]) -> Result<Self, TrainError> {
        let sample_ids =
            StringArray::from_iter_values(records.iter().map(|r| r.sample_id.as_str()));
        let sources = StringArray::from_iter_values(records.iter().map(|r| r.source.as_str()));
        let token_counts = UInt32Array::from_iter_values(records.iter().map(|r| r.token_count));
        let has_question: BooleanArray = records.iter().map(|r| Some(r.has_question)).collect();
        let has_trigger: BooleanArray = records.iter().map(|r| Some(r.has_trigger)).collect();
        let texts = StringArray::from_iter_values(records.iter().map(|r| r.text.as_str()));

        let columns: Vec<ArrayRef> = vec![
            Arc::new(sample_ids),
            Arc::new(sources),
            Arc::new(token_counts),
            Arc::new(has_question),
            Arc::new(has_trigger),
            Arc::new(texts),
        ];
        let batch = RecordBatch::try_new(Arc::new(features::feature_schema()), columns)?;
        Ok(Self { batch })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Read the frame back into row records.
    pub fn records(&self) -> Result<Vec<FeatureRecord>, TrainError> {
        let batch = &self.batch;
        let sample_id = column(batch, features::SAMPLE_ID)?;
        let source = column(batch, features::SOURCE)?;
        let text = column(batch, features::TEXT)?;
        let token_count = column(batch, features::TOKEN_COUNT)?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| TrainError::Frame("token_count column is not UInt32".into()))?;
        let has_question = bool_column(batch, features::HAS_QUESTION)?;
        let has_trigger = bool_column(batch, features::HAS_TRIGGER)?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(FeatureRecord {
                    sample_id: get_string(sample_id.as_ref(), row)
                        .ok_or_else(|| TrainError::Frame(format!("null sample_id at row {row}")))?,
                    source: get_string(source.as_ref(), row).unwrap_or_default(),
                    token_count: token_count.value(row),
                    has_question: has_question.value(row),
                    has_trigger: has_trigger.value(row),
                    text: get_string(text.as_ref(), row).unwrap_or_default(),
                })
            })
            .collect()
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, TrainError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| TrainError::Frame(format!("missing '{name}' column")))
}

fn bool_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a BooleanArray, TrainError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| TrainError::Frame(format!("{name} column is not Boolean")))
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
