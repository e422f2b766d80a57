//! LLM trait for text completion.
//!
//! The pipeline only ever needs one capability from a model: turn a prompt
//! into text. Prompting strategy lives in `pipeline::prompts`; providers,
//! rate limiting and retries live behind this trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ModelResult;

/// Callback receiving answer text as it is generated.
pub type DeltaFn = dyn Fn(&str) + Send + Sync;

/// Opaque text-completion primitive.
///
/// Implementations wrap specific providers (Groq, OpenAI, local models) or
/// decorate another `Llm` (see [`crate::llm::RateLimitedLlm`] and
/// [`crate::llm::RetryingLlm`]).
#[async_trait]
pub trait Llm: Send + Sync {
    /// Complete `prompt` with `model`, returning the raw response text.
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String>;

    /// Complete a chat turn: a `system` instruction plus a `user` message.
    ///
    /// When `on_delta` is given, text is passed to it as it arrives; the
    /// concatenated deltas equal the returned string. Providers without
    /// roles or streaming get the default, which joins both messages into
    /// one prompt and emits the whole answer as a single delta.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        let text = self.complete(&format!("{system}\n\n{user}"), model).await?;
        if let Some(on_delta) = on_delta {
            on_delta(&text);
        }
        Ok(text)
    }
}

#[async_trait]
impl<L: Llm + ?Sized> Llm for Arc<L> {
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String> {
        (**self).complete(prompt, model).await
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        (**self).chat(system, user, model, on_delta).await
    }
}
