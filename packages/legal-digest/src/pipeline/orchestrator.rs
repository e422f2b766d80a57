//! The Orchestrator - main entry point for running digests.
//!
//! Wires chunker -> transform -> batched reducer for the summary and risk
//! pipelines and owns the [`Session`] that holds their results.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut digest = Orchestrator::new(llm, PipelineConfig::default())?;
//!
//! let summary = digest.run_summary(&document).await?;
//! let risks = digest.run_risk_assessment(&document).await?;
//! let answer = digest.ask("Can the landlord terminate early?").await?;
//! ```

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{DigestError, Result};
use crate::pipeline::{
    chunker::split_document,
    context::RunContext,
    prompts::PipelineTemplates,
    reduce::reduce_until_singleton,
    transform::transform_all,
};
use crate::session::Session;
use crate::traits::{
    llm::{DeltaFn, Llm},
    progress::{NoProgress, ProgressEvent, ProgressReporter, Stage},
};
use crate::types::{
    artifact::{Artifact, ArtifactKind},
    chunk::Chunk,
    config::{PipelineConfig, ReductionPolicy},
    document::Document,
    state::PipelineState,
};

/// Forwards progress to the caller's reporter and mirrors it into the
/// pipeline's state channel.
struct StateTracker<'a> {
    state: &'a watch::Sender<PipelineState>,
    inner: &'a dyn ProgressReporter,
}

impl ProgressReporter for StateTracker<'_> {
    fn report(&self, event: ProgressEvent) {
        let state = match event.stage {
            Stage::Transform => PipelineState::Transforming {
                completed: event.completed,
                total: event.total,
            },
            Stage::Reduce { level } => PipelineState::Reducing {
                level,
                completed: event.completed,
                total: event.total,
            },
        };
        self.state.send_replace(state);
        self.inner.report(event);
    }
}

/// Runs the summary and risk pipelines over a document and answers
/// questions about the results.
pub struct Orchestrator<L: Llm> {
    llm: L,
    config: PipelineConfig,
    summary_templates: PipelineTemplates,
    risk_templates: PipelineTemplates,
    progress: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
    session: Session,
}

impl<L: Llm> Orchestrator<L> {
    /// Create an orchestrator, validating `config`.
    pub fn new(llm: L, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            llm,
            config,
            summary_templates: PipelineTemplates::for_kind(ArtifactKind::Summary),
            risk_templates: PipelineTemplates::for_kind(ArtifactKind::RiskReport),
            progress: Arc::new(NoProgress),
            cancel: CancellationToken::new(),
            session: Session::new(),
        })
    }

    /// Receive progress events from every run.
    pub fn with_progress(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress = Arc::new(reporter);
        self
    }

    /// Override the prompts of one pipeline.
    pub fn with_templates(mut self, kind: ArtifactKind, templates: PipelineTemplates) -> Self {
        match kind {
            ArtifactKind::Summary => self.summary_templates = templates,
            ArtifactKind::RiskReport => self.risk_templates = templates,
        }
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Token that cancels the current run between LLM calls.
    ///
    /// After a cancelled run the orchestrator installs a fresh token, so
    /// fetch a new one before the next run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Watch a pipeline's state while runs are in progress.
    pub fn subscribe(&self, kind: ArtifactKind) -> watch::Receiver<PipelineState> {
        self.session.subscribe(kind)
    }

    /// Make `document` current. A document with different content starts a
    /// new session.
    pub fn load_document(&mut self, document: &Document) {
        if self.session.install_document(document) {
            info!(
                session = %self.session.id(),
                source = %document.source,
                kind = %document.kind,
                chars = document.char_len(),
                "Loaded document"
            );
        }
    }

    /// Start a fresh session on `document`, even if its content is unchanged.
    pub fn new_session(&mut self, document: &Document) {
        self.session.reset();
        self.load_document(document);
    }

    /// Discard the document, artifacts and history.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Produce the hierarchical summary of `document`.
    pub async fn run_summary(&mut self, document: &Document) -> Result<Artifact> {
        self.run(ArtifactKind::Summary, document).await
    }

    /// Produce the hierarchical risk report of `document`.
    pub async fn run_risk_assessment(&mut self, document: &Document) -> Result<Artifact> {
        self.run(ArtifactKind::RiskReport, document).await
    }

    /// Answer a question grounded in the current summary and risk report.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        self.ask_streaming(question, None).await
    }

    /// Like [`ask`](Self::ask), passing answer text to `on_delta` as it arrives.
    ///
    /// Cancelling the token abandons the call and appends nothing to the
    /// history.
    pub async fn ask_streaming(
        &mut self,
        question: &str,
        on_delta: Option<&DeltaFn>,
    ) -> Result<String> {
        let result = {
            let answer =
                self.session
                    .ask_streaming(&self.llm, &self.config.model, question, on_delta);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(DigestError::Cancelled),
                result = answer => result,
            }
        };

        if matches!(result, Err(DigestError::Cancelled)) {
            warn!("Question cancelled");
            self.cancel = CancellationToken::new();
        }
        result
    }

    /// Run one pipeline to completion or failure.
    ///
    /// On failure the state becomes `Failed`, intermediate results are
    /// dropped and any earlier artifact of this pipeline stays in place.
    pub async fn run(&mut self, kind: ArtifactKind, document: &Document) -> Result<Artifact> {
        if document.is_blank() {
            warn!(source = %document.source, pipeline = %kind, "Document has no text");
            return Err(DigestError::empty(format!(
                "document {} has no text",
                document.source
            )));
        }

        self.load_document(document);
        self.session.set_state(kind, PipelineState::Chunking);

        let outcome = match self.chunks_for_current_document() {
            Ok(chunks) => self.execute(kind, &chunks).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(artifact) => {
                info!(
                    pipeline = %kind,
                    chunks = artifact.chunk_count,
                    levels = artifact.levels,
                    chars = artifact.text.len(),
                    "Pipeline complete"
                );
                self.session.store_artifact(artifact.clone());
                self.session.set_state(kind, PipelineState::Complete);
                Ok(artifact)
            }
            Err(e) => {
                warn!(pipeline = %kind, error = %e, "Pipeline failed");
                self.session.set_state(
                    kind,
                    PipelineState::Failed {
                        reason: e.to_string(),
                    },
                );
                if matches!(e, DigestError::Cancelled) {
                    self.cancel = CancellationToken::new();
                }
                Err(e)
            }
        }
    }

    /// Chunk the current document once and share the result between pipelines.
    fn chunks_for_current_document(&mut self) -> Result<Arc<Vec<Chunk>>> {
        if let Some(chunks) = self.session.cached_chunks() {
            return Ok(chunks);
        }

        let document = self
            .session
            .document()
            .ok_or_else(|| DigestError::empty("no document loaded"))?;
        let chunks = split_document(document, &self.config)?;
        if chunks.is_empty() {
            return Err(DigestError::empty("document produced no chunks"));
        }

        info!(
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            overlap = self.config.chunk_overlap,
            "Chunked document"
        );
        let chunks = Arc::new(chunks);
        self.session.set_chunks(chunks.clone());
        Ok(chunks)
    }

    async fn execute(&self, kind: ArtifactKind, chunks: &[Chunk]) -> Result<Artifact> {
        let (templates, policy) = self.pipeline_parts(kind);
        let tracker = StateTracker {
            state: self.session.state_sender(kind),
            inner: self.progress.as_ref(),
        };
        let ctx = RunContext::new(kind, &self.config.model, &tracker, &self.cancel)
            .with_concurrency(self.config.concurrency);

        self.session.set_state(
            kind,
            PipelineState::Transforming {
                completed: 0,
                total: chunks.len(),
            },
        );
        let transformed = transform_all(&self.llm, chunks, &templates.transform, &ctx).await?;

        let reduction =
            reduce_until_singleton(&self.llm, transformed, policy, templates, &ctx).await?;

        Ok(Artifact::new(kind, reduction.text)
            .with_chunk_count(chunks.len())
            .with_levels(reduction.levels))
    }

    fn pipeline_parts(&self, kind: ArtifactKind) -> (&PipelineTemplates, &ReductionPolicy) {
        match kind {
            ArtifactKind::Summary => (&self.summary_templates, &self.config.summary),
            ArtifactKind::RiskReport => (&self.risk_templates, &self.config.risk),
        }
    }
}
