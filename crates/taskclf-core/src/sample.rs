//! Normalised query samples produced by the collection stage.

use serde::{Deserialize, Serialize};

/// A single query to be labeled and classified.
///
/// Read-only input to the labeling and training stages. `sample_id` must be
/// unique within a sample store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_id: String,
    pub source: String,
    /// Text to classify. May be empty.
    pub query: String,
    #[serde(default)]
    pub context: Option<String>,
    /// Gold reference carried through untouched.
    #[serde(default)]
    pub reference: Option<String>,
}

impl SampleRecord {
    pub fn new(
        sample_id: impl Into<String>,
        source: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            sample_id: sample_id.into(),
            source: source.into(),
            query: query.into(),
            context: None,
            reference: None,
        }
    }

    /// Number of whitespace-delimited tokens in `query`.
    pub fn token_count(&self) -> usize {
        self.query.split_whitespace().count()
    }
}
