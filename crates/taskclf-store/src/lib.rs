//! Storage layer: whole-file JSONL artifacts laid out by
//! [`ArtifactLayout`](taskclf_core::ArtifactLayout).

mod artifacts;
mod error;
pub mod jsonl;

pub use artifacts::ArtifactStore;
pub use error::StoreError;
