//! Core trait abstractions.
//!
//! - [`llm::Llm`] - the text-completion primitive every stage calls
//! - [`progress::ProgressReporter`] - observer for stage progress

pub mod llm;
pub mod progress;
