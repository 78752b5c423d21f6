//! Pipeline configuration.
//!
//! Every stage takes a [`PipelineConfig`] explicitly. Values come from an
//! optional TOML file; the CLI overrides individual fields on top.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::taxonomy::Taxonomy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// On-disk layout of every artifact the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactLayout {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models").join("task_classifier"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl ArtifactLayout {
    /// Layout with every directory rooted under `root`.
    pub fn rooted(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: root.join(defaults.data_dir),
            model_dir: root.join(defaults.model_dir),
            report_dir: root.join(defaults.report_dir),
        }
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn label_dir(&self) -> PathBuf {
        self.data_dir.join("labels")
    }

    pub fn samples_path(&self) -> PathBuf {
        self.processed_dir().join("combined_samples.jsonl")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.label_dir().join("labels.jsonl")
    }

    pub fn review_queue_path(&self) -> PathBuf {
        self.label_dir().join("manual_review_queue.jsonl")
    }

    pub fn model_path(&self, model_name: &str, axis: &str) -> PathBuf {
        self.model_dir.join(format!("{model_name}_{axis}.json"))
    }

    pub fn metrics_path(&self, model_name: &str) -> PathBuf {
        self.report_dir.join(format!("{model_name}_metrics.jsonl"))
    }

    pub fn class_report_path(&self, model_name: &str) -> PathBuf {
        self.report_dir
            .join(format!("{model_name}_classification_report.json"))
    }

    /// Directories a full run writes into.
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.processed_dir(),
            self.label_dir(),
            self.model_dir.clone(),
            self.report_dir.clone(),
        ]
    }
}

/// Keyword heuristic labeler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub urgency_keywords: Vec<String>,
    pub privacy_keywords: Vec<String>,
    pub knowledge_keywords: Vec<String>,
    /// Queries with more tokens than this are `complex`.
    pub complexity_threshold: usize,
    pub confidence: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| w.to_string()).collect()
        }
        Self {
            urgency_keywords: words(&["now", "immediately", "urgent", "real-time", "实时"]),
            privacy_keywords: words(&["privacy", "personal", "密码", "account"]),
            knowledge_keywords: words(&["cite", "source", "reference", "百科", "explain"]),
            complexity_threshold: 80,
            confidence: 0.35,
        }
    }
}

/// Feature builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lexical trigger whose presence becomes the `has_trigger` feature.
    pub trigger: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            trigger: "now".to_string(),
        }
    }
}

/// Estimator hyperparameters. Which estimator runs is `model_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Logistic regression: gradient descent iterations.
    pub max_iter: usize,
    /// Step size as a fraction of the inverse Lipschitz bound.
    pub learning_rate: f64,
    /// Stop when the largest gradient component falls below this.
    pub tolerance: f64,
    /// Inverse L2 regularisation strength.
    pub c: f64,
    /// Decision tree: maximum depth.
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 1.0,
            tolerance: 1e-6,
            c: 1.0,
            max_depth: 8,
            min_samples_split: 2,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iter == 0 {
            return Err(ConfigError::Invalid("estimator max_iter must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "estimator learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "estimator tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "estimator c must be positive, got {}",
                self.c
            )));
        }
        Ok(())
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: ArtifactLayout,
    /// Estimator identifier: `logistic_regression` or `decision_tree`.
    pub model_name: String,
    /// Enable the keyword heuristic labeler during reconciliation.
    pub use_heuristic: bool,
    pub manual_labels: Option<PathBuf>,
    pub seed: u64,
    pub test_fraction: f64,
    pub heuristic: HeuristicConfig,
    pub features: FeatureConfig,
    pub estimator: EstimatorConfig,
    pub taxonomy: Taxonomy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: ArtifactLayout::default(),
            model_name: "logistic_regression".to_string(),
            use_heuristic: false,
            manual_labels: None,
            seed: 42,
            test_fraction: 0.2,
            heuristic: HeuristicConfig::default(),
            features: FeatureConfig::default(),
            estimator: EstimatorConfig::default(),
            taxonomy: Taxonomy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a TOML config file. Missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.taxonomy.is_empty() {
            return Err(ConfigError::Invalid("taxonomy has no axes".into()));
        }
        let mut seen = HashSet::new();
        for axis in &self.taxonomy.axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate taxonomy axis '{}'",
                    axis.name
                )));
            }
            if axis.values.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "taxonomy axis '{}' has no values",
                    axis.name
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.heuristic.confidence) {
            return Err(ConfigError::Invalid(format!(
                "heuristic confidence must be in [0, 1], got {}",
                self.heuristic.confidence
            )));
        }
        self.estimator.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_reference_paths() {
        let layout = ArtifactLayout::default();
        assert_eq!(
            layout.samples_path(),
            PathBuf::from("data/processed/combined_samples.jsonl")
        );
        assert_eq!(layout.labels_path(), PathBuf::from("data/labels/labels.jsonl"));
        assert_eq!(
            layout.review_queue_path(),
            PathBuf::from("data/labels/manual_review_queue.jsonl")
        );
        assert_eq!(
            layout.model_path("decision_tree", "latency"),
            PathBuf::from("models/task_classifier/decision_tree_latency.json")
        );
        assert_eq!(
            layout.metrics_path("logistic_regression"),
            PathBuf::from("reports/logistic_regression_metrics.jsonl")
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            model_name = "decision_tree"
            use_heuristic = true

            [heuristic]
            urgency_keywords = ["asap"]
            "#,
        )
        .unwrap();
        assert_eq!(config.model_name, "decision_tree");
        assert!(config.use_heuristic);
        assert_eq!(config.heuristic.urgency_keywords, vec!["asap".to_string()]);
        assert_eq!(config.heuristic.complexity_threshold, 80);
        assert_eq!(config.seed, 42);
        assert_eq!(config.taxonomy.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_test_fraction() {
        let config = PipelineConfig {
            test_fraction: 1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_duplicate_axes() {
        let mut config = PipelineConfig::default();
        let first = config.taxonomy.axes[0].clone();
        config.taxonomy.axes.push(first);
        assert!(config.validate().is_err());
    }

    fn with_estimator(edit: impl FnOnce(&mut EstimatorConfig)) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        edit(&mut config.estimator);
        config
    }

    #[test]
    fn rejects_non_positive_c() {
        for c in [0.0, -1.0, f64::NAN] {
            let config = with_estimator(|e| e.c = c);
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("c must be positive"), "{c}: {err}");
        }
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        for rate in [0.0, -0.5, f64::INFINITY] {
            let config = with_estimator(|e| e.learning_rate = rate);
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("learning_rate"), "{rate}: {err}");
        }
    }

    #[test]
    fn rejects_zero_max_iter() {
        let config = with_estimator(|e| e.max_iter = 0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_iter"));
    }

    #[test]
    fn rejects_non_finite_tolerance() {
        for tol in [f64::NAN, f64::INFINITY, -1e-3] {
            let config = with_estimator(|e| e.tolerance = tol);
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("tolerance"), "{tol}: {err}");
        }
    }

    #[test]
    fn estimator_errors_surface_from_toml() {
        let config: PipelineConfig = toml::from_str("[estimator]\nc = 0.0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = PipelineConfig::load(Path::new("/nonexistent/taskclf.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
