//! Auto-labeling strategies.
//!
//! A strategy maps a sample to a [`TaskLabel`] or declines with `None`, which
//! routes the sample to manual review. The reconciler only sees the trait, so
//! stronger strategies slot in without touching it.

use taskclf_core::taxonomy::{COMPLEXITY, DEVICE_LOAD, KNOWLEDGE, LATENCY, PRIVACY};
use taskclf_core::{HeuristicConfig, PipelineConfig, SampleRecord, TaskLabel};

/// Provenance tag written by [`KeywordHeuristicLabeler`].
pub const HEURISTIC_SOURCE: &str = "heuristic";

const HEURISTIC_JUSTIFICATION: &str = "keyword fallback";

pub trait LabelingStrategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Label a sample, or `None` to request human review.
    fn label(&self, sample: &SampleRecord) -> Option<TaskLabel>;
}

/// Rule-based fallback labeler driven by keyword containment and query length.
///
/// Total: it labels every sample, at a fixed low confidence.
#[derive(Debug, Clone)]
pub struct KeywordHeuristicLabeler {
    urgency: Vec<String>,
    privacy: Vec<String>,
    knowledge: Vec<String>,
    complexity_threshold: usize,
    confidence: f64,
}

impl Default for KeywordHeuristicLabeler {
    fn default() -> Self {
        Self::from_config(&HeuristicConfig::default())
    }
}

impl KeywordHeuristicLabeler {
    pub fn from_config(config: &HeuristicConfig) -> Self {
        fn lowered(words: &[String]) -> Vec<String> {
            words
                .iter()
                .filter(|w| !w.is_empty())
                .map(|w| w.to_lowercase())
                .collect()
        }
        Self {
            urgency: lowered(&config.urgency_keywords),
            privacy: lowered(&config.privacy_keywords),
            knowledge: lowered(&config.knowledge_keywords),
            complexity_threshold: config.complexity_threshold,
            confidence: config.confidence,
        }
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

impl LabelingStrategy for KeywordHeuristicLabeler {
    fn name(&self) -> &str {
        HEURISTIC_SOURCE
    }

    fn label(&self, sample: &SampleRecord) -> Option<TaskLabel> {
        let query = sample.query.to_lowercase();
        let complex = sample.token_count() > self.complexity_threshold;

        let complexity = if complex { "complex" } else { "simple" };
        let latency = if contains_any(&query, &self.urgency) {
            "realtime"
        } else {
            "relaxed"
        };
        let privacy = if contains_any(&query, &self.privacy) {
            "private"
        } else {
            "public"
        };
        let knowledge = if contains_any(&query, &self.knowledge) {
            "high"
        } else {
            "low"
        };
        let device_load = if complex { "heavy" } else { "light" };

        Some(
            TaskLabel::new(self.confidence, HEURISTIC_SOURCE)
                .with_axis(COMPLEXITY, complexity)
                .with_axis(LATENCY, latency)
                .with_axis(PRIVACY, privacy)
                .with_axis(KNOWLEDGE, knowledge)
                .with_axis(DEVICE_LOAD, device_load)
                .with_justification(HEURISTIC_JUSTIFICATION),
        )
    }
}

/// The strategy enabled by `config`, if any.
pub fn configured_strategy(config: &PipelineConfig) -> Option<Box<dyn LabelingStrategy>> {
    config.use_heuristic.then(|| {
        Box::new(KeywordHeuristicLabeler::from_config(&config.heuristic))
            as Box<dyn LabelingStrategy>
    })
}
