//! Artifact types - the final text of a completed pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pipeline produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Summary,
    RiskReport,
}

impl ArtifactKind {
    /// Heading used when the artifact is shown or used as QA context.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::RiskReport => "Risk Assessment",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => f.write_str("summary"),
            Self::RiskReport => f.write_str("risk"),
        }
    }
}

/// Final output of a pipeline run.
///
/// Replaced wholesale by the next successful run; never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,

    /// The final text
    pub text: String,

    /// Chunks the run started from
    pub chunk_count: usize,

    /// Reduction passes applied (0 for single-chunk documents)
    pub levels: usize,

    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            chunk_count: 0,
            levels: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }
}
