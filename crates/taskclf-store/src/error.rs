use std::path::PathBuf;

use taskclf_core::LabelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required upstream artifact is missing; the producing stage must be (re)run.
    #[error("required artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON at {path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("duplicate sample_id {0:?} in sample store")]
    DuplicateSampleId(String),

    #[error(transparent)]
    Label(#[from] LabelError),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
