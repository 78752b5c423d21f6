//! Labeling and training layer: auto-labeling strategies, manual/auto label
//! reconciliation, lexical features, and one classifier per taxonomy axis.

mod error;
pub mod estimator;
pub mod features;
pub mod labels;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod reconcile;
pub mod split;
pub mod strategy;
pub mod trainer;

pub use error::TrainError;
pub use estimator::ModelKind;
pub use features::{FeatureBuilder, FeatureFrame, FeatureRecord};
pub use labels::{LabelSet, LabelSummary};
pub use pipeline::AxisPipeline;
pub use reconcile::{Reconciliation, reconcile};
pub use strategy::{KeywordHeuristicLabeler, LabelingStrategy, configured_strategy};
pub use trainer::{AxisResult, Trainer, TrainingRun};
