use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(
        "unsupported model '{0}' (expected one of: {supported})",
        supported = crate::ModelKind::SUPPORTED.join(", ")
    )]
    UnsupportedModel(String),

    #[error(
        "axis '{axis}': class '{class}' has {count} sample(s), stratified split needs at least 2"
    )]
    InsufficientClassSamples {
        axis: String,
        class: String,
        count: usize,
    },

    #[error("axis '{0}': no labeled samples")]
    NoLabeledSamples(String),

    #[error("model serialization unavailable: {0}")]
    SerializationUnavailable(String),

    #[error("pipeline mismatch: fitted for {found}, expected {expected}")]
    PipelineMismatch { expected: String, found: String },

    #[error("pipeline artifact not found: {0}")]
    PipelineNotFound(PathBuf),

    #[error("pipeline I/O at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[cfg(feature = "export")]
    #[error("pipeline JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("feature frame: {0}")]
    Frame(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
