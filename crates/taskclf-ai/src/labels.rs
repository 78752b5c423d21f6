//! Reconciled labels keyed by sample id.
//!
//! Built from label-store rows. The trainer joins features against a
//! [`LabelSet`] one axis at a time.

use std::collections::{BTreeMap, HashMap};

use taskclf_core::{LabelRecord, TaskLabel, Taxonomy};
use tracing::info;

/// Taxonomy labels keyed by `sample_id`.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: HashMap<String, TaskLabel>,
}

/// Summary statistics for a [`LabelSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSummary {
    pub total: usize,
    /// provenance tag → count
    pub by_source: BTreeMap<String, usize>,
    /// axis → value → count, for registry axes
    pub distribution: BTreeMap<String, BTreeMap<String, usize>>,
}

impl LabelSet {
    /// Build from label-store rows. On duplicate ids the later row wins.
    pub fn from_records(records: &[LabelRecord]) -> Self {
        let labels = records
            .iter()
            .map(|r| (r.sample_id.clone(), r.label.clone()))
            .collect();
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, sample_id: &str) -> Option<&TaskLabel> {
        self.labels.get(sample_id)
    }

    /// Non-empty value for one axis of one sample.
    pub fn axis_value(&self, sample_id: &str, axis: &str) -> Option<&str> {
        self.get(sample_id)
            .and_then(|l| l.get(axis))
            .filter(|v| !v.is_empty())
    }

    /// Summary statistics over the registry axes.
    pub fn summary(&self, taxonomy: &Taxonomy) -> LabelSummary {
        let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
        let mut distribution: BTreeMap<String, BTreeMap<String, usize>> = taxonomy
            .axis_names()
            .map(|a| (a.to_string(), BTreeMap::new()))
            .collect();

        for label in self.labels.values() {
            *by_source.entry(label.source.clone()).or_default() += 1;
            for (axis, counts) in distribution.iter_mut() {
                if let Some(value) = label.get(axis) {
                    *counts.entry(value.to_string()).or_default() += 1;
                }
            }
        }

        LabelSummary {
            total: self.labels.len(),
            by_source,
            distribution,
        }
    }
}

impl LabelSummary {
    pub fn log(&self) {
        info!(total = self.total, by_source = ?self.by_source, "label summary");
        for (axis, counts) in &self.distribution {
            info!(axis = %axis, counts = ?counts, "label distribution");
        }
    }
}
