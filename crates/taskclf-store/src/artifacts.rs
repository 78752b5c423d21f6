//! Layout-aware access to the pipeline's durable artifacts.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use taskclf_core::{
    ArtifactLayout, AxisReportRow, ClassificationReport, LabelRecord, SampleRecord, Taxonomy,
};
use tracing::{debug, info, warn};

use crate::StoreError;
use crate::jsonl::{read_jsonl, write_json, write_jsonl};

/// Reads and writes samples, labels, review queues, and reports.
///
/// Every write replaces the whole file; stages never append.
pub struct ArtifactStore {
    layout: ArtifactLayout,
}

impl ArtifactStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Create every output directory of the layout.
    pub fn prepare_dirs(&self) -> Result<(), StoreError> {
        for dir in self.layout.output_dirs() {
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    // ── Samples ──

    /// Load the combined sample store. Rejects duplicate `sample_id`s.
    pub fn load_samples(&self) -> Result<Vec<SampleRecord>, StoreError> {
        let path = self.layout.samples_path();
        let samples: Vec<SampleRecord> = read_jsonl(&path)?;

        let mut seen = HashSet::with_capacity(samples.len());
        for sample in &samples {
            if !seen.insert(sample.sample_id.as_str()) {
                return Err(StoreError::DuplicateSampleId(sample.sample_id.clone()));
            }
        }

        info!(count = samples.len(), path = %path.display(), "loaded samples");
        Ok(samples)
    }

    /// Overwrite the sample store. Used by tests and upstream tooling.
    pub fn save_samples(&self, samples: &[SampleRecord]) -> Result<usize, StoreError> {
        write_jsonl(&self.layout.samples_path(), samples)
    }

    // ── Labels ──

    /// Load manually supplied labels keyed by `sample_id`.
    ///
    /// A configured path that does not exist yields no labels with a warning;
    /// manual labels are optional input. Every row must carry all registry
    /// axes. On duplicate ids the later row wins.
    pub fn load_manual_labels(
        &self,
        path: &Path,
        taxonomy: &Taxonomy,
    ) -> Result<HashMap<String, LabelRecord>, StoreError> {
        if !path.exists() {
            warn!(path = %path.display(), "manual labels file not found, continuing without");
            return Ok(HashMap::new());
        }
        let rows: Vec<Map<String, Value>> = read_jsonl(path)?;
        let mut labels = HashMap::with_capacity(rows.len());
        for row in &rows {
            let record = LabelRecord::from_json_row(row, taxonomy)?;
            if let Some(previous) = labels.insert(record.sample_id.clone(), record) {
                warn!(
                    sample_id = %previous.sample_id,
                    "duplicate manual label, keeping the later row"
                );
            }
        }
        info!(count = labels.len(), path = %path.display(), "loaded manual labels");
        Ok(labels)
    }

    /// Overwrite the label store, axis keys in registry order.
    pub fn save_label_store(
        &self,
        records: &[LabelRecord],
        taxonomy: &Taxonomy,
    ) -> Result<usize, StoreError> {
        let path = self.layout.labels_path();
        let rows: Vec<_> = records.iter().map(|r| r.row(taxonomy)).collect();
        let count = write_jsonl(&path, &rows)?;
        info!(count, path = %path.display(), "saved labels");
        Ok(count)
    }

    /// Load the reconciled label store, validating each row against the registry.
    pub fn load_label_store(&self, taxonomy: &Taxonomy) -> Result<Vec<LabelRecord>, StoreError> {
        let path = self.layout.labels_path();
        let rows: Vec<Map<String, Value>> = read_jsonl(&path)?;
        let records = rows
            .iter()
            .map(|row| LabelRecord::from_json_row(row, taxonomy))
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = records.len(), path = %path.display(), "loaded labels");
        Ok(records)
    }

    /// Persist the review queue. An empty queue writes nothing and removes any
    /// queue left over from an earlier run.
    pub fn save_review_queue(&self, queue: &[SampleRecord]) -> Result<usize, StoreError> {
        let path = self.layout.review_queue_path();
        if queue.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                debug!(path = %path.display(), "removed stale review queue");
            }
            return Ok(0);
        }
        let count = write_jsonl(&path, queue)?;
        info!(count, path = %path.display(), "queued samples for manual review");
        Ok(count)
    }

    // ── Reports ──

    /// Overwrite the per-axis weighted-average metrics report.
    pub fn save_metrics(
        &self,
        model_name: &str,
        rows: &[AxisReportRow],
    ) -> Result<PathBuf, StoreError> {
        let path = self.layout.metrics_path(model_name);
        write_jsonl(&path, rows)?;
        info!(axes = rows.len(), path = %path.display(), "saved metrics");
        Ok(path)
    }

    pub fn load_metrics(&self, model_name: &str) -> Result<Vec<AxisReportRow>, StoreError> {
        read_jsonl(&self.layout.metrics_path(model_name))
    }

    /// Overwrite the full per-class classification reports, keyed by axis.
    pub fn save_class_reports(
        &self,
        model_name: &str,
        reports: &BTreeMap<String, ClassificationReport>,
    ) -> Result<PathBuf, StoreError> {
        let path = self.layout.class_report_path(model_name);
        write_json(&path, reports)?;
        debug!(path = %path.display(), "saved classification reports");
        Ok(path)
    }
}
