//! Per-axis training and evaluation.
//!
//! Each taxonomy axis is an independent task: its own inner join, its own
//! stratified split, its own pipeline. Axes run in parallel and results are
//! collected in registry order.

use std::collections::BTreeMap;

use rayon::prelude::*;
use taskclf_core::{
    ArtifactLayout, AxisReportRow, ClassificationReport, EstimatorConfig, PipelineConfig, Taxonomy,
};
use tracing::{debug, info, warn};

use crate::TrainError;
use crate::estimator::ModelKind;
use crate::features::{FeatureFrame, FeatureRecord};
use crate::labels::LabelSet;
use crate::metrics::classification_report;
use crate::pipeline::AxisPipeline;
use crate::split::{Split, stratified_split};

/// Outcome of training or evaluating one axis.
#[derive(Debug, Clone)]
pub struct AxisResult {
    pub axis: String,
    pub pipeline: AxisPipeline,
    /// Held-out classification report.
    pub report: ClassificationReport,
    pub train_ids: Vec<String>,
    pub test_ids: Vec<String>,
}

/// Per-axis outcomes of one run, in registry order.
#[derive(Debug)]
pub struct TrainingRun {
    pub model_name: String,
    pub outcomes: Vec<(String, Result<AxisResult, TrainError>)>,
}

impl TrainingRun {
    pub fn succeeded(&self) -> impl Iterator<Item = &AxisResult> {
        self.outcomes.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn failures(&self) -> Vec<(&str, &TrainError)> {
        self.outcomes
            .iter()
            .filter_map(|(axis, r)| r.as_ref().err().map(|e| (axis.as_str(), e)))
            .collect()
    }

    /// Weighted-average rows for successfully trained axes.
    pub fn report_rows(&self) -> Vec<AxisReportRow> {
        self.succeeded()
            .map(|r| AxisReportRow::from_report(&r.axis, &r.report))
            .collect()
    }

    pub fn class_reports(&self) -> BTreeMap<String, ClassificationReport> {
        self.succeeded()
            .map(|r| (r.axis.clone(), r.report.clone()))
            .collect()
    }
}

/// One axis's labeled rows and their split.
struct Prepared<'a> {
    rows: Vec<&'a FeatureRecord>,
    labels: Vec<&'a str>,
    split: Split,
}

impl<'a> Prepared<'a> {
    fn train_rows(&self) -> (Vec<&'a FeatureRecord>, Vec<&'a str>) {
        self.pick(&self.split.train)
    }

    fn test_rows(&self) -> (Vec<&'a FeatureRecord>, Vec<&'a str>) {
        self.pick(&self.split.test)
    }

    fn pick(&self, idx: &[usize]) -> (Vec<&'a FeatureRecord>, Vec<&'a str>) {
        idx.iter().map(|&i| (self.rows[i], self.labels[i])).unzip()
    }

    fn ids(&self, idx: &[usize]) -> Vec<String> {
        idx.iter().map(|&i| self.rows[i].sample_id.clone()).collect()
    }
}

/// Fits one pipeline per taxonomy axis with a fixed estimator kind.
#[derive(Debug, Clone)]
pub struct Trainer {
    kind: ModelKind,
    estimator: EstimatorConfig,
    taxonomy: Taxonomy,
    layout: ArtifactLayout,
    seed: u64,
    test_fraction: f64,
}

impl Trainer {
    /// Fails with [`TrainError::UnsupportedModel`] for an unknown `model_name`.
    pub fn new(config: &PipelineConfig) -> Result<Self, TrainError> {
        let kind: ModelKind = config.model_name.parse()?;
        Ok(Self {
            kind,
            estimator: config.estimator.clone(),
            taxonomy: config.taxonomy.clone(),
            layout: config.layout.clone(),
            seed: config.seed,
            test_fraction: config.test_fraction,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    fn prepare<'a>(
        &self,
        axis: &str,
        records: &'a [FeatureRecord],
        labels: &'a LabelSet,
    ) -> Result<Prepared<'a>, TrainError> {
        let (rows, values): (Vec<&FeatureRecord>, Vec<&str>) = records
            .iter()
            .filter_map(|r| labels.axis_value(&r.sample_id, axis).map(|v| (r, v)))
            .unzip();
        if rows.is_empty() {
            return Err(TrainError::NoLabeledSamples(axis.to_string()));
        }
        let split = stratified_split(axis, &values, self.test_fraction, self.seed)?;
        debug!(
            axis = %axis,
            labeled = rows.len(),
            train = split.train.len(),
            test = split.test.len(),
            "split axis"
        );
        Ok(Prepared {
            rows,
            labels: values,
            split,
        })
    }

    fn score(
        &self,
        axis: &str,
        pipeline: AxisPipeline,
        prepared: &Prepared<'_>,
    ) -> AxisResult {
        let (test_rows, test_labels) = prepared.test_rows();
        let predicted = pipeline.predict_all(&test_rows);
        let report = classification_report(&test_labels, &predicted);
        info!(
            axis = %axis,
            model = %self.kind,
            classes = pipeline.classes.len(),
            accuracy = report.accuracy,
            precision = report.weighted_avg.precision,
            recall = report.weighted_avg.recall,
            f1 = report.weighted_avg.f1_score,
            support = report.weighted_avg.support,
            "axis scored"
        );
        AxisResult {
            axis: axis.to_string(),
            pipeline,
            report,
            train_ids: prepared.ids(&prepared.split.train),
            test_ids: prepared.ids(&prepared.split.test),
        }
    }

    fn fit(&self, axis: &str, prepared: &Prepared<'_>) -> AxisPipeline {
        let (train_rows, train_labels) = prepared.train_rows();
        AxisPipeline::fit(axis, self.kind, &self.estimator, &train_rows, &train_labels)
    }

    /// Fit and score one axis. Samples without a value for `axis` are skipped.
    pub fn train_axis(
        &self,
        axis: &str,
        records: &[FeatureRecord],
        labels: &LabelSet,
    ) -> Result<AxisResult, TrainError> {
        let prepared = self.prepare(axis, records, labels)?;
        let pipeline = self.fit(axis, &prepared);
        Ok(self.score(axis, pipeline, &prepared))
    }

    /// Score one axis with its exported pipeline, refitting if it can't be loaded.
    pub fn evaluate_axis(
        &self,
        axis: &str,
        records: &[FeatureRecord],
        labels: &LabelSet,
    ) -> Result<AxisResult, TrainError> {
        let prepared = self.prepare(axis, records, labels)?;
        let path = self.layout.model_path(self.kind.as_str(), axis);
        let pipeline = match AxisPipeline::load(&path, axis, self.kind) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    axis = %axis,
                    path = %path.display(),
                    error = %e,
                    "no usable exported pipeline, refitting"
                );
                self.fit(axis, &prepared)
            }
        };
        Ok(self.score(axis, pipeline, &prepared))
    }

    /// Train every registry axis and export each fitted pipeline.
    ///
    /// A build without serialization skips exports with a warning. Any other
    /// export failure fails that axis.
    pub fn train_all(
        &self,
        frame: &FeatureFrame,
        labels: &LabelSet,
    ) -> Result<TrainingRun, TrainError> {
        let records = frame.records()?;
        let mut run = self.run_axes(|axis| self.train_axis(axis, &records, labels));
        for (axis, outcome) in run.outcomes.iter_mut() {
            let failed = match outcome {
                Ok(result) => self.export(&result.pipeline).err(),
                Err(_) => None,
            };
            if let Some(e) = failed {
                warn!(axis = %axis, error = %e, "axis failed");
                *outcome = Err(e);
            }
        }
        Ok(run)
    }

    /// Re-score every registry axis on its held-out partition.
    pub fn evaluate_all(
        &self,
        frame: &FeatureFrame,
        labels: &LabelSet,
    ) -> Result<TrainingRun, TrainError> {
        let records = frame.records()?;
        Ok(self.run_axes(|axis| self.evaluate_axis(axis, &records, labels)))
    }

    fn run_axes<F>(&self, f: F) -> TrainingRun
    where
        F: Fn(&str) -> Result<AxisResult, TrainError> + Sync,
    {
        let outcomes: Vec<(String, Result<AxisResult, TrainError>)> = self
            .taxonomy
            .axes
            .par_iter()
            .map(|spec| (spec.name.clone(), f(&spec.name)))
            .collect();

        for (axis, outcome) in &outcomes {
            if let Err(e) = outcome {
                warn!(axis = %axis, error = %e, "axis failed");
            }
        }

        TrainingRun {
            model_name: self.kind.to_string(),
            outcomes,
        }
    }

    fn export(&self, pipeline: &AxisPipeline) -> Result<(), TrainError> {
        let path = self.layout.model_path(self.kind.as_str(), &pipeline.axis);
        match pipeline.export(&path) {
            Ok(()) => {
                info!(axis = %pipeline.axis, path = %path.display(), "exported pipeline");
                Ok(())
            }
            Err(TrainError::SerializationUnavailable(reason)) => {
                warn!(axis = %pipeline.axis, reason = %reason, "pipeline export skipped");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
