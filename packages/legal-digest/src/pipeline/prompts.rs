//! LLM prompts for the summary, risk and Q&A stages.
//!
//! Stage templates carry exactly one `{text}` placeholder; the grounded Q&A
//! prompt is assembled separately because it takes two inputs.

use std::borrow::Cow;

use crate::error::{DigestError, Result};
use crate::types::artifact::ArtifactKind;

/// Prompt for summarizing one chunk of a legal document.
pub const CHUNK_SUMMARY_PROMPT: &str = r#"You are a legal analyst. Summarize the following excerpt of a legal document.

Capture:
1. Parties and their roles
2. Obligations, rights and conditions
3. Dates, deadlines, amounts and durations
4. Definitions that later clauses depend on

Be factual and concise. Do not add information that is not in the excerpt.

Excerpt:
{text}"#;

/// Prompt for merging a batch of partial summaries.
pub const COMBINE_SUMMARIES_PROMPT: &str = r#"The following are summaries of consecutive sections of one legal document, in document order.

Merge them into a single coherent summary of those sections. Keep every obligation, party, date and amount; remove repetition; preserve the order in which topics appear.

Section summaries:
{text}"#;

/// Prompt for the final summary combination.
pub const FINAL_SUMMARY_PROMPT: &str = r#"The following are summaries covering an entire legal document, in document order.

Write the final summary of the document with these sections:
- Overview (type of document, parties, purpose)
- Key Terms (obligations, payments, durations, termination)
- Important Dates and Deadlines
- Notable Clauses

Partial summaries:
{text}"#;

/// Prompt for assessing risks in one chunk.
pub const CHUNK_RISK_PROMPT: &str = r#"You are a legal risk analyst. Identify potential legal risks in the following excerpt of a legal document.

For each risk give:
- The clause or wording involved
- Why it is risky and for which party
- Severity (Low / Medium / High)

If the excerpt contains no meaningful risk, say so in one sentence.

Excerpt:
{text}"#;

/// Prompt for merging a batch of risk findings.
pub const COMBINE_RISKS_PROMPT: &str = r#"The following are risk findings for consecutive sections of one legal document, in document order.

Merge them into one list. Combine duplicates, keep the highest severity when findings overlap, and keep the clause references.

Risk findings:
{text}"#;

/// Prompt for the final risk report.
pub const FINAL_RISK_PROMPT: &str = r#"The following are risk findings covering an entire legal document, in document order.

Write the final risk assessment:
- Overall risk level (Low / Medium / High) with a one-paragraph justification
- High-severity risks
- Medium-severity risks
- Low-severity risks
- Recommendations (clauses to negotiate, clarify or add)

Risk findings:
{text}"#;

/// System message for grounded Q&A.
pub const QA_SYSTEM_PROMPT: &str = "You are a careful legal assistant. Answer the question using only the context in the user message, which was generated from a legal document.

If the context does not contain enough information to answer, say so explicitly instead of guessing. Do not present your answer as legal advice.";

/// User message for grounded Q&A.
pub const QA_USER_PROMPT: &str = r#"Context:
{context}

Question: {question}"#;

/// Answer returned when the summary or the risk report is missing.
pub const QA_FALLBACK_ANSWER: &str =
    "Please generate both the summary and the risk assessment before asking questions about the document.";

/// Stage template identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    ChunkSummary,
    CombineSummaries,
    FinalSummary,
    ChunkRisk,
    CombineRisks,
    FinalRisk,
}

impl TemplateId {
    pub const ALL: [TemplateId; 6] = [
        TemplateId::ChunkSummary,
        TemplateId::CombineSummaries,
        TemplateId::FinalSummary,
        TemplateId::ChunkRisk,
        TemplateId::CombineRisks,
        TemplateId::FinalRisk,
    ];

    pub fn body(self) -> &'static str {
        match self {
            TemplateId::ChunkSummary => CHUNK_SUMMARY_PROMPT,
            TemplateId::CombineSummaries => COMBINE_SUMMARIES_PROMPT,
            TemplateId::FinalSummary => FINAL_SUMMARY_PROMPT,
            TemplateId::ChunkRisk => CHUNK_RISK_PROMPT,
            TemplateId::CombineRisks => COMBINE_RISKS_PROMPT,
            TemplateId::FinalRisk => FINAL_RISK_PROMPT,
        }
    }

    pub fn template(self) -> PromptTemplate {
        PromptTemplate {
            body: Cow::Borrowed(self.body()),
        }
    }
}

/// A prompt with exactly one `{text}` substitution point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    body: Cow<'static, str>,
}

impl PromptTemplate {
    pub const PLACEHOLDER: &'static str = "{text}";

    /// Build a custom template, rejecting bodies without exactly one placeholder.
    pub fn new(body: impl Into<Cow<'static, str>>) -> Result<Self> {
        let body = body.into();
        let count = body.matches(Self::PLACEHOLDER).count();
        if count != 1 {
            return Err(DigestError::invalid_config(format!(
                "prompt template must contain exactly one {} placeholder (found {})",
                Self::PLACEHOLDER,
                count
            )));
        }
        Ok(Self { body })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Substitute `text` into the template.
    pub fn render(&self, text: &str) -> String {
        self.body.replacen(Self::PLACEHOLDER, text, 1)
    }
}

/// The three templates one pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTemplates {
    /// Per-chunk transform
    pub transform: PromptTemplate,

    /// Intermediate reduction passes
    pub combine: PromptTemplate,

    /// The pass that produces the single final text
    pub finalize: PromptTemplate,
}

impl PipelineTemplates {
    pub fn for_kind(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Summary => Self {
                transform: TemplateId::ChunkSummary.template(),
                combine: TemplateId::CombineSummaries.template(),
                finalize: TemplateId::FinalSummary.template(),
            },
            ArtifactKind::RiskReport => Self {
                transform: TemplateId::ChunkRisk.template(),
                combine: TemplateId::CombineRisks.template(),
                finalize: TemplateId::FinalRisk.template(),
            },
        }
    }
}

/// Format the grounded Q&A user message.
pub fn format_qa_prompt(context: &str, question: &str) -> String {
    let (before, after) = QA_USER_PROMPT
        .split_once("{context}")
        .unwrap_or((QA_USER_PROMPT, ""));
    let after = after.replacen("{question}", question, 1);
    format!("{before}{context}{after}")
}
