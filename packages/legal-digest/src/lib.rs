//! Legal Document Digest Library
//!
//! Summarizes legal documents, assesses their risks and answers questions
//! about them with staged LLM calls.
//!
//! # Design Philosophy
//!
//! - Map-reduce, not one giant prompt: chunk, transform each chunk, then
//!   combine in batches until one text remains
//! - Plain text in, plain text out
//! - Answers grounded in generated artifacts only, never the raw document
//! - Library handles mechanics, the caller picks the model and prompts
//!
//! # Usage
//!
//! ```rust,ignore
//! use legal_digest::{loaders, Orchestrator, PipelineConfig};
//! use legal_digest::testing::MockLlm;
//!
//! let config = PipelineConfig::default();
//! let llm = legal_digest::llm::guarded(MockLlm::new(), &config)?;
//! let mut digest = Orchestrator::new(llm, config)?;
//!
//! let document = loaders::load_path("lease.pdf").await?;
//! let summary = digest.run_summary(&document).await?;
//! let risks = digest.run_risk_assessment(&document).await?;
//! let answer = digest.ask("Who pays for repairs?").await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Llm, ProgressReporter)
//! - [`types`] - Documents, chunks, artifacts, config and run state
//! - [`pipeline`] - Chunker, transform, batched reducer, orchestrator, Q&A
//! - [`llm`] - Rate limiting, retry and timeout wrappers, provider impls
//! - [`loaders`] - Text, CSV and PDF loaders
//! - [`session`] - Per-document working state
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod llm;
pub mod loaders;
pub mod pipeline;
pub mod session;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DigestError, LoadError, ModelError, ModelErrorKind};
pub use traits::{
    llm::{DeltaFn, Llm},
    progress::{NoProgress, ProgressEvent, ProgressReporter, Stage, TracingProgress},
};
pub use types::{
    artifact::{Artifact, ArtifactKind},
    chunk::Chunk,
    config::{PipelineConfig, ReductionPolicy, RetryConfig},
    conversation::{Conversation, ConversationTurn, Role},
    document::{Document, MediaKind},
    state::PipelineState,
};

pub use pipeline::{GroundedQa, Orchestrator, PipelineTemplates, PromptTemplate, TemplateId};
pub use session::Session;

// Re-export LLM wrappers
pub use llm::{guarded, GuardedLlm, LlmExt, RateLimitedLlm, RetryingLlm, TimeoutLlm};

#[cfg(feature = "openai")]
pub use llm::OpenAiLlm;

// Re-export testing utilities
pub use testing::MockLlm;
