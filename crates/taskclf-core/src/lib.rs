pub mod config;
pub mod label;
pub mod metrics;
pub mod sample;
pub mod schema;
pub mod taxonomy;

pub use config::{
    ArtifactLayout, ConfigError, EstimatorConfig, FeatureConfig, HeuristicConfig, PipelineConfig,
};
pub use label::{LabelError, LabelRecord, LabelRow, TaskLabel};
pub use metrics::{AxisReportRow, ClassMetrics, ClassificationReport};
pub use sample::SampleRecord;
pub use schema::features;
pub use taxonomy::{AxisSpec, Taxonomy};
