//! Pipeline run state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a pipeline run currently stands.
///
/// `NotStarted -> Chunking -> Transforming -> Reducing -> Complete`, with
/// `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    NotStarted,
    Chunking,
    Transforming {
        completed: usize,
        total: usize,
    },
    Reducing {
        level: usize,
        completed: usize,
        total: usize,
    },
    Complete,
    Failed {
        reason: String,
    },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Chunking | Self::Transforming { .. } | Self::Reducing { .. }
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Chunking => write!(f, "chunking"),
            Self::Transforming { completed, total } => {
                write!(f, "transforming {}/{}", completed, total)
            }
            Self::Reducing {
                level,
                completed,
                total,
            } => write!(f, "reducing L{} {}/{}", level + 1, completed, total),
            Self::Complete => write!(f, "complete"),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
