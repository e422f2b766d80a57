//! Grounded Q&A over the generated artifacts.

use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::prompts::{format_qa_prompt, QA_FALLBACK_ANSWER, QA_SYSTEM_PROMPT};
use crate::traits::llm::{DeltaFn, Llm};
use crate::types::{
    artifact::Artifact,
    conversation::{Conversation, ConversationTurn},
};

/// Build the labeled context block: summary first, then risk report.
pub fn build_context(summary: &Artifact, risk: &Artifact) -> String {
    format!(
        "{}:\n{}\n\n{}:\n{}",
        summary.kind.label(),
        summary.text,
        risk.kind.label(),
        risk.text
    )
}

/// Answers questions and owns the conversation history.
#[derive(Debug, Default)]
pub struct GroundedQa {
    history: Conversation,
}

impl GroundedQa {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `question` from the summary and risk report.
    ///
    /// With either artifact missing, returns [`QA_FALLBACK_ANSWER`] without
    /// calling the model. Both paths append one user turn and one assistant
    /// turn. A model failure appends nothing.
    pub async fn answer<L: Llm + ?Sized>(
        &mut self,
        llm: &L,
        model: &str,
        question: &str,
        summary: Option<&Artifact>,
        risk: Option<&Artifact>,
    ) -> Result<String> {
        self.answer_streaming(llm, model, question, summary, risk, None)
            .await
    }

    /// Like [`answer`](Self::answer), passing answer text to `on_delta` as
    /// it arrives. The fallback is emitted as one delta. History always
    /// receives the complete answer.
    pub async fn answer_streaming<L: Llm + ?Sized>(
        &mut self,
        llm: &L,
        model: &str,
        question: &str,
        summary: Option<&Artifact>,
        risk: Option<&Artifact>,
        on_delta: Option<&DeltaFn>,
    ) -> Result<String> {
        let answer = match (summary, risk) {
            (Some(summary), Some(risk)) => {
                let user = format_qa_prompt(&build_context(summary, risk), question);
                debug!(prompt_len = user.len(), "Asking grounded question");
                llm.chat(QA_SYSTEM_PROMPT, &user, model, on_delta).await?
            }
            _ => {
                info!(
                    has_summary = summary.is_some(),
                    has_risk = risk.is_some(),
                    "Context missing, returning fallback answer"
                );
                if let Some(on_delta) = on_delta {
                    on_delta(QA_FALLBACK_ANSWER);
                }
                QA_FALLBACK_ANSWER.to_string()
            }
        };

        self.history.push_exchange(question, answer.clone());
        Ok(answer)
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.history.turns()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DigestError, ModelError};
    use crate::testing::MockLlm;
    use std::sync::{Arc, Mutex};
    use crate::types::{artifact::ArtifactKind, conversation::Role};

    fn summary() -> Artifact {
        Artifact::new(ArtifactKind::Summary, "A two-year office lease.")
    }

    fn risk() -> Artifact {
        Artifact::new(ArtifactKind::RiskReport, "Unlimited indemnity (High).")
    }

    #[test]
    fn test_context_labels_and_order() {
        let context = build_context(&summary(), &risk());
        assert_eq!(
            context,
            "Summary:\nA two-year office lease.\n\nRisk Assessment:\nUnlimited indemnity (High)."
        );
    }

    #[tokio::test]
    async fn test_fallback_without_context() {
        let llm = MockLlm::new();
        let mut qa = GroundedQa::new();

        let none = qa.answer(&llm, "m", "What is the term?", None, None).await.unwrap();
        let partial = qa
            .answer(&llm, "m", "Any risks?", Some(&summary()), None)
            .await
            .unwrap();
        let other = qa
            .answer(&llm, "m", "Any risks?", None, Some(&risk()))
            .await
            .unwrap();

        assert_eq!(none, QA_FALLBACK_ANSWER);
        assert_eq!(partial, QA_FALLBACK_ANSWER);
        assert_eq!(other, QA_FALLBACK_ANSWER);
        assert_eq!(llm.call_count(), 0);
        assert_eq!(qa.history().len(), 6);
    }

    #[tokio::test]
    async fn test_grounded_answer_is_verbatim() {
        let llm = MockLlm::new().with_response_for("Question: How long?", "  Two years.\n");
        let mut qa = GroundedQa::new();

        let answer = qa
            .answer(&llm, "m", "How long?", Some(&summary()), Some(&risk()))
            .await
            .unwrap();

        assert_eq!(answer, "  Two years.\n");
        let call = &llm.calls()[0];
        assert_eq!(call.system.as_deref(), Some(QA_SYSTEM_PROMPT));
        let prompt = &call.prompt;
        assert!(prompt.contains("Summary:\nA two-year office lease."));
        assert!(prompt.find("Summary:").unwrap() < prompt.find("Risk Assessment:").unwrap());

        let history = qa.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "How long?");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].text, "  Two years.\n");
    }

    #[tokio::test]
    async fn test_streamed_deltas_match_stored_answer() {
        let llm = MockLlm::new().with_response_for("How long?", "Two years, renewable once.");
        let mut qa = GroundedQa::new();
        let streamed = Arc::new(Mutex::new(String::new()));
        let sink = streamed.clone();
        let on_delta = move |delta: &str| sink.lock().unwrap().push_str(delta);

        let answer = qa
            .answer_streaming(&llm, "m", "How long?", Some(&summary()), Some(&risk()), Some(&on_delta))
            .await
            .unwrap();

        assert_eq!(*streamed.lock().unwrap(), answer);
        assert_eq!(qa.history()[1].text, "Two years, renewable once.");
    }

    #[tokio::test]
    async fn test_fallback_is_streamed_once() {
        let llm = MockLlm::new();
        let mut qa = GroundedQa::new();
        let deltas = Arc::new(Mutex::new(Vec::new()));
        let sink = deltas.clone();
        let on_delta = move |delta: &str| sink.lock().unwrap().push(delta.to_string());

        qa.answer_streaming(&llm, "m", "Any risks?", None, None, Some(&on_delta))
            .await
            .unwrap();

        assert_eq!(*deltas.lock().unwrap(), vec![QA_FALLBACK_ANSWER.to_string()]);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_appends_nothing() {
        let llm = MockLlm::new().fail_on_call(1, ModelError::timeout("deadline"));
        let mut qa = GroundedQa::new();

        let result = qa
            .answer(&llm, "m", "How long?", Some(&summary()), Some(&risk()))
            .await;

        assert!(matches!(result, Err(DigestError::Model(_))));
        assert!(qa.history().is_empty());
    }
}
