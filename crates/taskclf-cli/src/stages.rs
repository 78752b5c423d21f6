//! Stage drivers: label, train, evaluate.
//!
//! Each stage reads its inputs from the artifact store, runs to completion, and
//! writes its outputs whole-file.

use std::collections::HashMap;

use anyhow::Context;
use taskclf_ai::{
    FeatureBuilder, FeatureFrame, LabelSet, Trainer, TrainingRun, configured_strategy, reconcile,
};
use taskclf_core::PipelineConfig;
use taskclf_store::{ArtifactStore, StoreError};
use tracing::{info, warn};

pub struct LabelStats {
    pub labeled: usize,
    pub queued: usize,
}

/// Reconcile manual labels and the configured strategy over the sample store.
pub fn run_label(config: &PipelineConfig, store: &ArtifactStore) -> anyhow::Result<LabelStats> {
    let samples = store
        .load_samples()
        .context("loading sample store (run the collection stage first)")?;

    let manual = match &config.manual_labels {
        Some(path) => store
            .load_manual_labels(path, &config.taxonomy)
            .with_context(|| format!("loading manual labels from {}", path.display()))?,
        None => HashMap::new(),
    };

    let strategy = configured_strategy(config);
    let rec = reconcile(&samples, &manual, strategy.as_deref());

    let labeled = store
        .save_label_store(&rec.labels, &config.taxonomy)
        .context("writing label store")?;
    let queued = store
        .save_review_queue(&rec.review_queue)
        .context("writing review queue")?;

    LabelSet::from_records(&rec.labels)
        .summary(&config.taxonomy)
        .log();

    Ok(LabelStats { labeled, queued })
}

/// Load samples and labels and build the shared feature frame.
fn load_inputs(
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> anyhow::Result<(FeatureFrame, LabelSet)> {
    let samples = store.load_samples().context("loading sample store")?;
    let records = store
        .load_label_store(&config.taxonomy)
        .context("loading label store (run the label stage first)")?;
    let labels = LabelSet::from_records(&records);
    if labels.is_empty() {
        warn!("label store is empty, every axis will fail");
    }

    let builder = FeatureBuilder::from_config(&config.features);
    let frame = FeatureFrame::from_samples(&samples, &builder).context("building feature frame")?;
    info!(samples = frame.num_rows(), labels = labels.len(), "inputs ready");
    Ok((frame, labels))
}

/// Train every axis, then write the metrics report and per-class reports.
pub fn run_train(config: &PipelineConfig, store: &ArtifactStore) -> anyhow::Result<TrainingRun> {
    // Unknown estimators fail here, before any input is read.
    let trainer = Trainer::new(config).context("configuring trainer")?;
    let (frame, labels) = load_inputs(config, store)?;

    let run = trainer.train_all(&frame, &labels).context("training")?;

    store
        .save_metrics(&run.model_name, &run.report_rows())
        .context("writing metrics report")?;
    store
        .save_class_reports(&run.model_name, &run.class_reports())
        .context("writing classification reports")?;
    Ok(run)
}

/// Re-score every axis. Reports are logged, not written. Axes whose scores
/// differ from the stored metrics report are flagged.
pub fn run_evaluate(
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> anyhow::Result<TrainingRun> {
    let trainer = Trainer::new(config).context("configuring trainer")?;
    let (frame, labels) = load_inputs(config, store)?;

    let run = trainer.evaluate_all(&frame, &labels).context("evaluating")?;
    let stored = match store.load_metrics(&run.model_name) {
        Ok(rows) => rows,
        Err(StoreError::ArtifactNotFound(_)) => Vec::new(),
        Err(e) => return Err(e).context("reading stored metrics report"),
    };
    for row in run.report_rows() {
        if let Some(prev) = stored.iter().find(|s| s.axis == row.axis) {
            if prev.metrics != row.metrics {
                warn!(
                    axis = %row.axis,
                    stored_f1 = prev.metrics.f1_score,
                    f1 = row.metrics.f1_score,
                    "re-scored metrics differ from stored report"
                );
            }
        }
    }
    for result in run.succeeded() {
        for (class, m) in &result.report.classes {
            info!(
                axis = %result.axis,
                class = %class,
                precision = m.precision,
                recall = m.recall,
                f1 = m.f1_score,
                support = m.support,
                "class report"
            );
        }
    }
    Ok(run)
}
