//! Taxonomy labels and the label-store record format.
//!
//! A [`TaskLabel`] maps axis name → categorical value and carries shared
//! provenance metadata. Label rows on disk are flat JSON objects: `sample_id`,
//! one key per axis, then `confidence`, `source` and `justification`.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::taxonomy::Taxonomy;

/// Provenance tag applied to manual labels that carry none.
pub const HUMAN_SOURCE: &str = "human";

/// Confidence applied to manual labels that carry none.
pub const HUMAN_CONFIDENCE: f64 = 1.0;

const SAMPLE_ID: &str = "sample_id";
const CONFIDENCE: &str = "confidence";
const SOURCE: &str = "source";
const JUSTIFICATION: &str = "justification";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabelError {
    #[error("malformed label record {sample_id:?}: {reason}")]
    Malformed { sample_id: String, reason: String },
}

impl LabelError {
    fn malformed(sample_id: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            sample_id: sample_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// A structured label covering every taxonomy axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskLabel {
    /// axis name → categorical value
    pub axes: BTreeMap<String, String>,
    pub confidence: f64,
    pub source: String,
    pub justification: Option<String>,
}

impl TaskLabel {
    pub fn new(confidence: f64, source: impl Into<String>) -> Self {
        Self {
            axes: BTreeMap::new(),
            confidence,
            source: source.into(),
            justification: None,
        }
    }

    pub fn with_axis(mut self, axis: &str, value: &str) -> Self {
        self.axes.insert(axis.to_string(), value.to_string());
        self
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    /// Value for one axis, if present.
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.axes.get(axis).map(|s| s.as_str())
    }

    /// Check that every registered axis is present, non-empty and inside its
    /// vocabulary, and that confidence lies in `[0, 1]`.
    pub fn validate(&self, sample_id: &str, taxonomy: &Taxonomy) -> Result<(), LabelError> {
        for axis in &taxonomy.axes {
            match self.get(&axis.name) {
                None => {
                    return Err(LabelError::malformed(
                        sample_id,
                        format!("missing axis '{}'", axis.name),
                    ));
                }
                Some("") => {
                    return Err(LabelError::malformed(
                        sample_id,
                        format!("empty value for axis '{}'", axis.name),
                    ));
                }
                Some(v) if !axis.allows(v) => {
                    return Err(LabelError::malformed(
                        sample_id,
                        format!(
                            "value '{v}' not in vocabulary of axis '{}' ({})",
                            axis.name,
                            axis.values.join(", ")
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(LabelError::malformed(
                sample_id,
                format!("confidence {} outside [0, 1]", self.confidence),
            ));
        }
        Ok(())
    }
}

/// One row of the label store: a sample id joined with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRecord {
    pub sample_id: String,
    pub label: TaskLabel,
}

impl LabelRecord {
    pub fn new(sample_id: impl Into<String>, label: TaskLabel) -> Self {
        Self {
            sample_id: sample_id.into(),
            label,
        }
    }

    /// Parse a flat JSON row against the registry.
    ///
    /// Only registered axes are read; other keys are ignored. Missing
    /// `confidence` and `source` take the human-label defaults.
    pub fn from_json_row(
        row: &Map<String, Value>,
        taxonomy: &Taxonomy,
    ) -> Result<Self, LabelError> {
        let sample_id = match row.get(SAMPLE_ID) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(LabelError::malformed("<missing>", "missing 'sample_id'")),
        };

        let mut axes = BTreeMap::new();
        for axis in taxonomy.axis_names() {
            match row.get(axis) {
                Some(Value::String(v)) => {
                    axes.insert(axis.to_string(), v.clone());
                }
                Some(Value::Null) | None => {
                    return Err(LabelError::malformed(
                        &sample_id,
                        format!("missing axis '{axis}'"),
                    ));
                }
                Some(other) => {
                    return Err(LabelError::malformed(
                        &sample_id,
                        format!("axis '{axis}' must be a string, got {other}"),
                    ));
                }
            }
        }

        let confidence = match row.get(CONFIDENCE) {
            None | Some(Value::Null) => HUMAN_CONFIDENCE,
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| LabelError::malformed(&sample_id, "confidence is not a float"))?,
            Some(other) => {
                return Err(LabelError::malformed(
                    &sample_id,
                    format!("confidence must be a number, got {other}"),
                ));
            }
        };

        let source = match row.get(SOURCE) {
            None | Some(Value::Null) => HUMAN_SOURCE.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(LabelError::malformed(
                    &sample_id,
                    format!("source must be a string, got {other}"),
                ));
            }
        };

        let justification = match row.get(JUSTIFICATION) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let label = TaskLabel {
            axes,
            confidence,
            source,
            justification,
        };
        label.validate(&sample_id, taxonomy)?;
        Ok(Self { sample_id, label })
    }
}

impl LabelRecord {
    /// Serializable view with axis keys in `taxonomy` order.
    pub fn row<'a>(&'a self, taxonomy: &'a Taxonomy) -> LabelRow<'a> {
        LabelRow {
            record: self,
            taxonomy,
        }
    }
}

/// A [`LabelRecord`] paired with the registry that fixes its key order.
///
/// Keys: `sample_id`, registry axes in order, any axes outside the registry
/// (sorted), then `confidence`, `source`, `justification`.
pub struct LabelRow<'a> {
    record: &'a LabelRecord,
    taxonomy: &'a Taxonomy,
}

impl Serialize for LabelRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let label = &self.record.label;
        let mut map = serializer.serialize_map(Some(label.axes.len() + 4))?;
        map.serialize_entry(SAMPLE_ID, &self.record.sample_id)?;
        for axis in self.taxonomy.axis_names() {
            if let Some(value) = label.axes.get(axis) {
                map.serialize_entry(axis, value)?;
            }
        }
        for (axis, value) in &label.axes {
            if self.taxonomy.axis(axis).is_none() {
                map.serialize_entry(axis, value)?;
            }
        }
        map.serialize_entry(CONFIDENCE, &label.confidence)?;
        map.serialize_entry(SOURCE, &label.source)?;
        map.serialize_entry(JUSTIFICATION, &label.justification)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_row() -> Map<String, Value> {
        let value = json!({
            "sample_id": "app-1",
            "complexity": "simple",
            "latency": "realtime",
            "privacy": "private",
            "knowledge": "low",
            "device_load": "light",
        });
        value.as_object().unwrap().clone()
    }

    #[test]
    fn manual_row_takes_human_defaults() {
        let record = LabelRecord::from_json_row(&full_row(), &Taxonomy::default()).unwrap();
        assert_eq!(record.sample_id, "app-1");
        assert_eq!(record.label.source, HUMAN_SOURCE);
        assert_eq!(record.label.confidence, HUMAN_CONFIDENCE);
        assert_eq!(record.label.get("latency"), Some("realtime"));
        assert!(record.label.justification.is_none());
    }

    #[test]
    fn explicit_source_is_kept() {
        let mut row = full_row();
        row.insert("source".into(), json!("annotator-7"));
        row.insert("confidence".into(), json!(0.8));
        let record = LabelRecord::from_json_row(&row, &Taxonomy::default()).unwrap();
        assert_eq!(record.label.source, "annotator-7");
        assert_eq!(record.label.confidence, 0.8);
    }

    #[test]
    fn missing_axis_is_malformed() {
        let mut row = full_row();
        row.remove("privacy");
        let err = LabelRecord::from_json_row(&row, &Taxonomy::default()).unwrap_err();
        let LabelError::Malformed { sample_id, reason } = err;
        assert_eq!(sample_id, "app-1");
        assert!(reason.contains("privacy"), "{reason}");
    }

    #[test]
    fn empty_axis_is_malformed() {
        let mut row = full_row();
        row.insert("knowledge".into(), json!(""));
        assert!(LabelRecord::from_json_row(&row, &Taxonomy::default()).is_err());
    }

    #[test]
    fn out_of_vocabulary_value_is_malformed() {
        let mut row = full_row();
        row.insert("complexity".into(), json!("medium"));
        assert!(LabelRecord::from_json_row(&row, &Taxonomy::default()).is_err());
    }

    #[test]
    fn confidence_out_of_range_is_malformed() {
        let mut row = full_row();
        row.insert("confidence".into(), json!(1.5));
        assert!(LabelRecord::from_json_row(&row, &Taxonomy::default()).is_err());
    }

    #[test]
    fn missing_sample_id_is_malformed() {
        let mut row = full_row();
        row.remove("sample_id");
        assert!(LabelRecord::from_json_row(&row, &Taxonomy::default()).is_err());
    }

    #[test]
    fn serializes_flat_with_sample_id_first() {
        let label = TaskLabel::new(0.35, "heuristic")
            .with_axis("latency", "relaxed")
            .with_axis("complexity", "simple")
            .with_justification("keyword fallback");
        let record = LabelRecord::new("s-1", label);
        let json = serde_json::to_string(&record.row(&Taxonomy::default())).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"sample_id":"s-1","complexity":"simple","latency":"relaxed","#,
                r#""confidence":0.35,"source":"heuristic","justification":"keyword fallback"}"#
            )
        );
    }

    #[test]
    fn axis_keys_follow_registry_order() {
        let label = TaskLabel::new(0.35, "heuristic")
            .with_axis("privacy", "public")
            .with_axis("device_load", "light")
            .with_axis("knowledge", "low")
            .with_axis("latency", "relaxed")
            .with_axis("complexity", "simple");
        let record = LabelRecord::new("s", label);
        let json = serde_json::to_string(&record.row(&Taxonomy::default())).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"sample_id":"s","complexity":"simple","latency":"relaxed","#,
                r#""privacy":"public","knowledge":"low","device_load":"light","#,
                r#""confidence":0.35,"source":"heuristic","justification":null}"#
            )
        );
    }

    #[test]
    fn serialized_row_parses_back() {
        let record = LabelRecord::from_json_row(&full_row(), &Taxonomy::default()).unwrap();
        let value = serde_json::to_value(record.row(&Taxonomy::default())).unwrap();
        let parsed = LabelRecord::from_json_row(value.as_object().unwrap(), &Taxonomy::default())
            .unwrap();
        assert_eq!(parsed, record);
    }
}
