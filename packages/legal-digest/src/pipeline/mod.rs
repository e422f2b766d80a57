//! Digest pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Chunking (overlapping character windows)
//! - Transform (one LLM call per chunk, order preserved)
//! - Batched reduction (recursive combination down to one text)
//! - Grounded Q&A over the finished artifacts

pub mod chunker;
pub mod context;
pub mod orchestrator;
pub mod prompts;
pub mod qa;
pub mod reduce;
pub mod transform;

pub use chunker::{split, split_document};
pub use context::{detached, RunContext};
pub use orchestrator::Orchestrator;
pub use prompts::{
    format_qa_prompt, PipelineTemplates, PromptTemplate, TemplateId, CHUNK_RISK_PROMPT,
    CHUNK_SUMMARY_PROMPT, COMBINE_RISKS_PROMPT, COMBINE_SUMMARIES_PROMPT, FINAL_RISK_PROMPT,
    FINAL_SUMMARY_PROMPT, QA_FALLBACK_ANSWER, QA_SYSTEM_PROMPT, QA_USER_PROMPT,
};
pub use qa::{build_context, GroundedQa};
pub use reduce::{reduce, reduce_until_singleton, Reduction, BATCH_SEPARATOR};
pub use transform::{transform, transform_all};
