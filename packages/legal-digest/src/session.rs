//! Session - explicit owner of one document's working state.
//!
//! Holds the current document, its chunks, both artifacts with their run
//! states, and the Q&A history. Loading a different document starts a new
//! session; nothing here outlives the process.

use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::qa::GroundedQa;
use crate::traits::llm::{DeltaFn, Llm};
use crate::types::{
    artifact::{Artifact, ArtifactKind},
    chunk::Chunk,
    conversation::ConversationTurn,
    document::Document,
    state::PipelineState,
};

/// State and artifact of one pipeline.
#[derive(Debug)]
struct PipelineSlot {
    state: watch::Sender<PipelineState>,
    artifact: Option<Artifact>,
}

impl PipelineSlot {
    fn new() -> Self {
        Self {
            state: watch::channel(PipelineState::NotStarted).0,
            artifact: None,
        }
    }

    fn clear(&mut self) {
        self.artifact = None;
        self.state.send_replace(PipelineState::NotStarted);
    }
}

/// Working state for the current document.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    document: Option<Arc<Document>>,
    chunks: Option<Arc<Vec<Chunk>>>,
    summary: PipelineSlot,
    risk: PipelineSlot,
    qa: GroundedQa,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            document: None,
            chunks: None,
            summary: PipelineSlot::new(),
            risk: PipelineSlot::new(),
            qa: GroundedQa::new(),
        }
    }

    /// Drop the document, chunks, artifacts and history.
    ///
    /// Existing state subscribers stay connected and observe `NotStarted`.
    pub fn reset(&mut self) {
        self.id = Uuid::now_v7();
        self.document = None;
        self.chunks = None;
        self.summary.clear();
        self.risk.clear();
        self.qa = GroundedQa::new();
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_deref()
    }

    pub fn chunks(&self) -> Option<&[Chunk]> {
        self.chunks.as_deref().map(Vec::as_slice)
    }

    pub fn summary(&self) -> Option<&Artifact> {
        self.summary.artifact.as_ref()
    }

    pub fn risk_report(&self) -> Option<&Artifact> {
        self.risk.artifact.as_ref()
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.slot(kind).artifact.as_ref()
    }

    /// Current state of a pipeline.
    pub fn state(&self, kind: ArtifactKind) -> PipelineState {
        self.slot(kind).state.borrow().clone()
    }

    /// Watch a pipeline's state, including while a run is in progress.
    pub fn subscribe(&self, kind: ArtifactKind) -> watch::Receiver<PipelineState> {
        self.slot(kind).state.subscribe()
    }

    /// Full Q&A history, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        self.qa.history()
    }

    /// Answer a question grounded in this session's artifacts.
    pub async fn ask<L: Llm + ?Sized>(
        &mut self,
        llm: &L,
        model: &str,
        question: &str,
    ) -> Result<String> {
        self.ask_streaming(llm, model, question, None).await
    }

    /// Like [`ask`](Self::ask), passing answer text to `on_delta` as it arrives.
    pub async fn ask_streaming<L: Llm + ?Sized>(
        &mut self,
        llm: &L,
        model: &str,
        question: &str,
        on_delta: Option<&DeltaFn>,
    ) -> Result<String> {
        self.qa
            .answer_streaming(
                llm,
                model,
                question,
                self.summary.artifact.as_ref(),
                self.risk.artifact.as_ref(),
                on_delta,
            )
            .await
    }

    /// Install `document`, starting a new session unless it has the same content.
    ///
    /// Returns `true` when the session was reset.
    pub(crate) fn install_document(&mut self, document: &Document) -> bool {
        if let Some(current) = &self.document {
            if current.same_content(document) {
                return false;
            }
        }
        self.reset();
        self.document = Some(Arc::new(document.clone()));
        true
    }

    pub(crate) fn cached_chunks(&self) -> Option<Arc<Vec<Chunk>>> {
        self.chunks.clone()
    }

    pub(crate) fn set_chunks(&mut self, chunks: Arc<Vec<Chunk>>) {
        self.chunks = Some(chunks);
    }

    pub(crate) fn state_sender(&self, kind: ArtifactKind) -> &watch::Sender<PipelineState> {
        &self.slot(kind).state
    }

    pub(crate) fn set_state(&self, kind: ArtifactKind, state: PipelineState) {
        self.slot(kind).state.send_replace(state);
    }

    /// Replace the artifact of its pipeline wholesale.
    pub(crate) fn store_artifact(&mut self, artifact: Artifact) {
        let kind = artifact.kind;
        self.slot_mut(kind).artifact = Some(artifact);
    }

    fn slot(&self, kind: ArtifactKind) -> &PipelineSlot {
        match kind {
            ArtifactKind::Summary => &self.summary,
            ArtifactKind::RiskReport => &self.risk,
        }
    }

    fn slot_mut(&mut self, kind: ArtifactKind) -> &mut PipelineSlot {
        match kind {
            ArtifactKind::Summary => &mut self.summary,
            ArtifactKind::RiskReport => &mut self.risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();

        assert!(session.document().is_none());
        assert!(session.chunks().is_none());
        assert!(session.summary().is_none());
        assert!(session.risk_report().is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.state(ArtifactKind::Summary), PipelineState::NotStarted);
    }

    #[test]
    fn test_same_document_keeps_artifacts() {
        let mut session = Session::new();
        let doc = Document::plain("lease.txt", "The tenant pays rent.");

        assert!(session.install_document(&doc));
        session.store_artifact(Artifact::new(ArtifactKind::Summary, "Lease."));

        let reloaded = Document::plain("copy.txt", "The tenant pays rent.");
        assert!(!session.install_document(&reloaded));
        assert!(session.summary().is_some());
    }

    #[test]
    fn test_new_document_resets_everything() {
        let mut session = Session::new();
        session.install_document(&Document::plain("a.txt", "first"));
        session.store_artifact(Artifact::new(ArtifactKind::RiskReport, "Risky."));
        session.set_state(ArtifactKind::RiskReport, PipelineState::Complete);
        let first_id = session.id();
        let watcher = session.subscribe(ArtifactKind::RiskReport);

        assert!(session.install_document(&Document::plain("b.txt", "second")));

        assert_ne!(session.id(), first_id);
        assert!(session.risk_report().is_none());
        assert_eq!(*watcher.borrow(), PipelineState::NotStarted);
        assert_eq!(session.document().unwrap().source, "b.txt");
    }

    #[test]
    fn test_store_artifact_replaces() {
        let mut session = Session::new();
        session.store_artifact(Artifact::new(ArtifactKind::Summary, "old"));
        session.store_artifact(Artifact::new(ArtifactKind::Summary, "new"));

        assert_eq!(session.summary().unwrap().text, "new");
        assert!(session.risk_report().is_none());
    }
}
