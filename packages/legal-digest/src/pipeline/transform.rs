//! Transform stage - one LLM call per chunk.

use futures::{stream, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::error::{DigestError, Result};
use crate::pipeline::context::RunContext;
use crate::pipeline::prompts::PromptTemplate;
use crate::traits::{llm::Llm, progress::Stage};
use crate::types::chunk::Chunk;

/// Apply `template` to one chunk of text with exactly one LLM call.
pub async fn transform<L: Llm + ?Sized>(
    llm: &L,
    model: &str,
    chunk_text: &str,
    template: &PromptTemplate,
) -> Result<String> {
    if chunk_text.is_empty() {
        return Err(DigestError::empty("chunk text"));
    }
    let prompt = template.render(chunk_text);
    Ok(llm.complete(&prompt, model).await?)
}

/// Transform every chunk, returning results in chunk order.
///
/// Up to `ctx.concurrency` calls run at once; results are reassembled in
/// input order regardless of completion order. The first failure aborts the
/// stage and drops every result computed so far.
pub async fn transform_all<L: Llm + ?Sized>(
    llm: &L,
    chunks: &[Chunk],
    template: &PromptTemplate,
    ctx: &RunContext<'_>,
) -> Result<Vec<String>> {
    if chunks.is_empty() {
        return Err(DigestError::empty("no chunks to transform"));
    }

    let total = chunks.len();
    let completed = AtomicUsize::new(0);
    let completed = &completed;

    let results = stream::iter(chunks.iter().map(|chunk| async move {
        ctx.check_cancelled()?;
        let output = transform(llm, ctx.model, &chunk.text, template)
            .await
            .map_err(|e| {
                warn!(pipeline = %ctx.pipeline, chunk = chunk.index, error = %e, "Chunk transform failed");
                e
            })?;
        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(pipeline = %ctx.pipeline, chunk = chunk.index, done, total, "Chunk transformed");
        ctx.report(Stage::Transform, done, total);
        Ok::<_, DigestError>(output)
    }))
    .buffered(ctx.concurrency)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(results)
}
