//! Progress reporting for pipeline runs.
//!
//! A run emits one event after every chunk transform and after every
//! reduction batch, so a front end can render `completed / total` bars.

use std::fmt;

use tracing::info;

use crate::types::artifact::ArtifactKind;

/// Which part of a pipeline an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Per-chunk transform
    Transform,

    /// Reduction pass, 0-indexed
    Reduce { level: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Transform => write!(f, "transform"),
            Stage::Reduce { level } => write!(f, "reduce L{}", level + 1),
        }
    }
}

/// A single progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub pipeline: ArtifactKind,
    pub stage: Stage,
    pub completed: usize,
    pub total: usize,
}

/// Receives progress events from a running pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Any `Fn(ProgressEvent)` closure is a reporter.
impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Logs every event at `info` level.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        info!(
            pipeline = %event.pipeline,
            stage = %event.stage,
            completed = event.completed,
            total = event.total,
            "progress"
        );
    }
}
