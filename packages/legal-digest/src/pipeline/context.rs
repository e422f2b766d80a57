//! Per-run context shared by the transform and reduce stages.

use tokio_util::sync::CancellationToken;

use crate::error::{DigestError, Result};
use crate::traits::progress::{NoProgress, ProgressEvent, ProgressReporter, Stage};
use crate::types::artifact::ArtifactKind;

/// Everything a stage needs besides the LLM and its inputs.
pub struct RunContext<'a> {
    /// Pipeline the stage belongs to (for progress events)
    pub pipeline: ArtifactKind,

    /// Model identifier passed to every call
    pub model: &'a str,

    /// Maximum transforms in flight
    pub concurrency: usize,

    pub progress: &'a dyn ProgressReporter,

    /// Checked between LLM calls, never during one
    pub cancel: &'a CancellationToken,
}

impl<'a> RunContext<'a> {
    pub fn new(
        pipeline: ArtifactKind,
        model: &'a str,
        progress: &'a dyn ProgressReporter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            pipeline,
            model,
            concurrency: 1,
            progress,
            cancel,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(DigestError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn report(&self, stage: Stage, completed: usize, total: usize) {
        self.progress.report(ProgressEvent {
            pipeline: self.pipeline,
            stage,
            completed,
            total,
        });
    }
}

/// Context for one-off calls in tests and examples: no progress, never cancelled.
pub fn detached<'a>(
    pipeline: ArtifactKind,
    model: &'a str,
    cancel: &'a CancellationToken,
) -> RunContext<'a> {
    RunContext::new(pipeline, model, &NoProgress, cancel)
}
