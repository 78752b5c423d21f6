//! Fitted per-axis pipeline: preprocessor, estimator, and class vocabulary.
//!
//! With the `export` feature a pipeline persists as one JSON document per
//! axis. Without it, [`AxisPipeline::export`] and [`AxisPipeline::load`]
//! return [`TrainError::SerializationUnavailable`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use taskclf_core::EstimatorConfig;

use crate::TrainError;
use crate::estimator::{FittedModel, ModelKind};
use crate::features::FeatureRecord;
use crate::preprocess::Preprocessor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisPipeline {
    pub axis: String,
    /// Sorted distinct training labels; estimator outputs index into this.
    pub classes: Vec<String>,
    pub preprocessor: Preprocessor,
    pub estimator: FittedModel,
}

impl AxisPipeline {
    /// Fit preprocessing and the estimator on training rows only.
    pub fn fit(
        axis: &str,
        kind: ModelKind,
        config: &EstimatorConfig,
        rows: &[&FeatureRecord],
        labels: &[&str],
    ) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        classes.sort_unstable();
        classes.dedup();

        let y: Vec<usize> = labels
            .iter()
            .map(|l| {
                classes
                    .binary_search_by(|c| c.as_str().cmp(l))
                    .unwrap_or_default()
            })
            .collect();

        let preprocessor = Preprocessor::fit(rows);
        let x = preprocessor.transform_all(rows);
        let estimator = FittedModel::fit(kind, config, &x, &y, classes.len());

        Self {
            axis: axis.to_string(),
            classes,
            preprocessor,
            estimator,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.estimator.kind()
    }

    pub fn predict(&self, row: &FeatureRecord) -> &str {
        let idx = self.estimator.predict(&self.preprocessor.transform(row));
        self.classes.get(idx).map(String::as_str).unwrap_or_default()
    }

    pub fn predict_all(&self, rows: &[&FeatureRecord]) -> Vec<&str> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    fn check(&self, axis: &str, kind: ModelKind) -> Result<(), TrainError> {
        if self.axis != axis || self.kind() != kind {
            return Err(TrainError::PipelineMismatch {
                expected: format!("{kind}/{axis}"),
                found: format!("{}/{}", self.kind(), self.axis),
            });
        }
        Ok(())
    }

    #[cfg(feature = "export")]
    pub fn export(&self, path: &Path) -> Result<(), TrainError> {
        let io = |source| TrainError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| TrainError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, bytes).map_err(io)?;
        tracing::debug!(path = %path.display(), axis = %self.axis, "exported pipeline");
        Ok(())
    }

    #[cfg(not(feature = "export"))]
    pub fn export(&self, path: &Path) -> Result<(), TrainError> {
        Err(TrainError::SerializationUnavailable(format!(
            "built without the `export` feature, not writing {}",
            path.display()
        )))
    }

    /// Load a pipeline and check it was fitted for `axis` with `kind`.
    #[cfg(feature = "export")]
    pub fn load(path: &Path, axis: &str, kind: ModelKind) -> Result<Self, TrainError> {
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TrainError::PipelineNotFound(path.to_path_buf())
            } else {
                TrainError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let pipeline: Self = serde_json::from_slice(&bytes).map_err(|source| TrainError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        pipeline.check(axis, kind)?;
        Ok(pipeline)
    }

    #[cfg(not(feature = "export"))]
    pub fn load(path: &Path, _axis: &str, _kind: ModelKind) -> Result<Self, TrainError> {
        Err(TrainError::SerializationUnavailable(format!(
            "built without the `export` feature, not reading {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: usize, source: &str, tokens: u32, trigger: bool) -> FeatureRecord {
        FeatureRecord {
            sample_id: format!("s{id}"),
            source: source.into(),
            token_count: tokens,
            has_question: false,
            has_trigger: trigger,
            text: String::new(),
        }
    }

    fn corpus() -> (Vec<FeatureRecord>, Vec<&'static str>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let trigger = i % 2 == 0;
            rows.push(row(i, "app", 5 + i as u32, trigger));
            labels.push(if trigger { "realtime" } else { "relaxed" });
        }
        (rows, labels)
    }

    #[test]
    fn fits_and_predicts_both_kinds() {
        let (rows, labels) = corpus();
        let refs: Vec<&FeatureRecord> = rows.iter().collect();
        for kind in [ModelKind::LogisticRegression, ModelKind::DecisionTree] {
            let p = AxisPipeline::fit("latency", kind, &EstimatorConfig::default(), &refs, &labels);
            assert_eq!(p.classes, vec!["realtime", "relaxed"]);
            assert_eq!(p.kind(), kind);
            assert_eq!(p.predict_all(&refs), labels, "{kind}");
        }
    }

    #[test]
    fn unseen_source_still_predicts() {
        let (rows, labels) = corpus();
        let refs: Vec<&FeatureRecord> = rows.iter().collect();
        let p = AxisPipeline::fit(
            "latency",
            ModelKind::DecisionTree,
            &EstimatorConfig::default(),
            &refs,
            &labels,
        );
        let label = p.predict(&row(99, "never_seen", 7, true));
        assert!(p.classes.iter().any(|c| c == label));
    }

    #[test]
    fn single_class_predicts_that_class() {
        let rows = [row(0, "app", 3, false), row(1, "app", 9, true)];
        let refs: Vec<&FeatureRecord> = rows.iter().collect();
        let p = AxisPipeline::fit(
            "privacy",
            ModelKind::LogisticRegression,
            &EstimatorConfig::default(),
            &refs,
            &["public", "public"],
        );
        assert_eq!(p.predict(&rows[1]), "public");
    }

    #[cfg(feature = "export")]
    #[test]
    fn export_then_load() {
        let (rows, labels) = corpus();
        let refs: Vec<&FeatureRecord> = rows.iter().collect();
        let p = AxisPipeline::fit(
            "latency",
            ModelKind::DecisionTree,
            &EstimatorConfig::default(),
            &refs,
            &labels,
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("decision_tree_latency.json");
        p.export(&path).unwrap();

        let loaded = AxisPipeline::load(&path, "latency", ModelKind::DecisionTree).unwrap();
        assert_eq!(loaded.classes, p.classes);
        assert_eq!(loaded.predict_all(&refs), p.predict_all(&refs));

        match AxisPipeline::load(&path, "latency", ModelKind::LogisticRegression) {
            Err(TrainError::PipelineMismatch { expected, found }) => {
                assert_eq!(expected, "logistic_regression/latency");
                assert_eq!(found, "decision_tree/latency");
            }
            other => panic!("expected PipelineMismatch, got {other:?}"),
        }
    }

    #[cfg(feature = "export")]
    #[test]
    fn load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = AxisPipeline::load(
            &dir.path().join("nope.json"),
            "latency",
            ModelKind::DecisionTree,
        )
        .unwrap_err();
        assert!(matches!(err, TrainError::PipelineNotFound(_)));
    }

    #[cfg(not(feature = "export"))]
    #[test]
    fn export_unavailable_without_feature() {
        let (rows, labels) = corpus();
        let refs: Vec<&FeatureRecord> = rows.iter().collect();
        let p = AxisPipeline::fit(
            "latency",
            ModelKind::DecisionTree,
            &EstimatorConfig::default(),
            &refs,
            &labels,
        );
        let err = p.export(Path::new("unused.json")).unwrap_err();
        assert!(matches!(err, TrainError::SerializationUnavailable(_)));
    }
}
