//! End-to-end pipeline tests against the mock LLM.
//!
//! These tests drive the full orchestrator:
//! 1. Chunk the document
//! 2. Transform every chunk
//! 3. Reduce to a single artifact
//! 4. Answer grounded questions

use legal_digest::{
    pipeline::chunker::split,
    testing::MockLlm,
    types::chunk::reassemble,
    ArtifactKind, DigestError, Document, ModelError, Orchestrator, PipelineConfig, PipelineState,
    ReductionPolicy, Role,
};

/// Helper to build a document of `chars` characters.
fn document_of(chars: usize) -> Document {
    let text: String = "The Lessee shall indemnify the Lessor against all claims. "
        .chars()
        .cycle()
        .take(chars)
        .collect();
    Document::plain("lease.txt", text)
}

#[test]
fn test_scenario_a_chunking() {
    let doc = document_of(2500);
    let chunks = split(&doc.text, 800, 100).unwrap();

    let lens: Vec<_> = chunks.iter().map(|c| c.char_len()).collect();
    let starts: Vec<_> = chunks.iter().map(|c| c.start).collect();
    assert_eq!(lens, vec![800, 800, 800, 400]);
    assert_eq!(starts, vec![0, 700, 1400, 2100]);
    assert_eq!(reassemble(&chunks), doc.text);
}

#[tokio::test]
async fn test_scenario_b_secondary_pass() {
    let llm = MockLlm::new();
    let policy = ReductionPolicy::default().with_level2_batch_size(2);
    let config = PipelineConfig::default().with_summary_policy(policy);
    let mut digest = Orchestrator::new(llm.clone(), config).unwrap();

    let artifact = digest.run_summary(&document_of(8400)).await.unwrap();

    assert_eq!(artifact.chunk_count, 12);
    assert_eq!(artifact.levels, 3);
    // 12 transforms, 3 level-1 batches, 1 level-2 batch (the other passes through), 1 final
    assert_eq!(llm.call_count(), 17);
    assert_eq!(artifact.text, "mock response #17");
}

#[tokio::test]
async fn test_scenario_c_transform_failure() {
    let llm = MockLlm::new().fail_on_call(3, ModelError::other("upstream 500"));
    let mut digest = Orchestrator::new(llm.clone(), PipelineConfig::default()).unwrap();

    let result = digest.run_summary(&document_of(3000)).await;

    assert!(matches!(result, Err(DigestError::Model(_))));
    assert_eq!(llm.call_count(), 3);
    assert!(digest.session().summary().is_none());
    match digest.session().state(ArtifactKind::Summary) {
        PipelineState::Failed { reason } => assert!(reason.contains("upstream 500")),
        other => panic!("expected Failed, got {other}"),
    }
}

#[tokio::test]
async fn test_scenario_d_grounded_answer() {
    let llm = MockLlm::new().with_response_for("Question: When does the lease end?", "  On 31 May.\n");
    let mut digest = Orchestrator::new(llm.clone(), PipelineConfig::default()).unwrap();
    let doc = document_of(2500);

    digest.run_summary(&doc).await.unwrap();
    digest.run_risk_assessment(&doc).await.unwrap();
    let answer = digest.ask("When does the lease end?").await.unwrap();

    assert_eq!(answer, "  On 31 May.\n");
    let history = digest.session().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].text, "When does the lease end?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].text, "  On 31 May.\n");
}

#[tokio::test]
async fn test_question_before_artifacts_gets_fallback() {
    let llm = MockLlm::new();
    let mut digest = Orchestrator::new(llm.clone(), PipelineConfig::default()).unwrap();

    digest.run_summary(&document_of(1000)).await.unwrap();
    let calls_before = llm.call_count();
    let answer = digest.ask("Is there a break clause?").await.unwrap();

    assert_eq!(answer, legal_digest::pipeline::QA_FALLBACK_ANSWER);
    assert_eq!(llm.call_count(), calls_before);
    assert_eq!(digest.session().history().len(), 2);
}

#[tokio::test]
async fn test_new_document_clears_session() {
    let llm = MockLlm::new();
    let mut digest = Orchestrator::new(llm, PipelineConfig::default()).unwrap();

    digest.run_summary(&document_of(1200)).await.unwrap();
    digest.ask("Anything?").await.unwrap();

    digest.load_document(&Document::plain("nda.txt", "Confidential information stays secret."));

    assert!(digest.session().summary().is_none());
    assert!(digest.session().history().is_empty());
    assert_eq!(
        digest.session().state(ArtifactKind::Summary),
        PipelineState::NotStarted
    );
}

#[tokio::test]
async fn test_concurrent_transforms_match_sequential() {
    let doc = document_of(6000);
    let echo = || MockLlm::new().with_responder(|prompt| prompt.len().to_string());

    let mut sequential = Orchestrator::new(echo(), PipelineConfig::default()).unwrap();
    let mut parallel =
        Orchestrator::new(echo(), PipelineConfig::default().with_concurrency(4)).unwrap();

    let a = sequential.run_risk_assessment(&doc).await.unwrap();
    let b = parallel.run_risk_assessment(&doc).await.unwrap();

    assert_eq!(a.text, b.text);
    assert_eq!(a.levels, b.levels);
}

#[tokio::test]
async fn test_risk_pipeline_uses_risk_prompts() {
    let llm = MockLlm::new();
    let mut digest = Orchestrator::new(llm.clone(), PipelineConfig::default()).unwrap();

    digest.run_risk_assessment(&document_of(900)).await.unwrap();

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].to_lowercase().contains("risk"));
    assert!(digest.session().risk_report().is_some());
    assert!(digest.session().summary().is_none());
}
