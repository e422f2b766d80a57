//! Batched reducer - recursive map-reduce combination.
//!
//! A pass partitions its inputs into contiguous batches, joins each batch in
//! order with [`BATCH_SEPARATOR`] and combines it with one LLM call. The
//! driver repeats passes, taking each batch size from a [`ReductionPolicy`],
//! until a single text remains.

use tracing::{debug, info};

use crate::error::{DigestError, Result};
use crate::pipeline::context::RunContext;
use crate::pipeline::prompts::{PipelineTemplates, PromptTemplate};
use crate::traits::{llm::Llm, progress::Stage};
use crate::types::config::ReductionPolicy;

/// Joins the members of a batch before they are submitted.
pub const BATCH_SEPARATOR: &str = "\n\n";

/// Result of a full reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// The single remaining text
    pub text: String,

    /// Passes applied
    pub levels: usize,
}

/// Run one reduction pass: one output per batch, in batch order.
///
/// A batch holding a single item is passed through without an LLM call.
pub async fn reduce<L: Llm + ?Sized>(
    llm: &L,
    items: &[String],
    batch_size: usize,
    template: &PromptTemplate,
    level: usize,
    ctx: &RunContext<'_>,
) -> Result<Vec<String>> {
    if batch_size == 0 {
        return Err(DigestError::invalid_config("batch_size must be >= 1"));
    }

    let total = items.len().div_ceil(batch_size);
    let mut outputs = Vec::with_capacity(total);

    for (i, batch) in items.chunks(batch_size).enumerate() {
        ctx.check_cancelled()?;

        let combined = if let [only] = batch {
            only.clone()
        } else {
            let prompt = template.render(&batch.join(BATCH_SEPARATOR));
            llm.complete(&prompt, ctx.model).await?
        };

        debug!(
            pipeline = %ctx.pipeline,
            level,
            batch = i,
            size = batch.len(),
            "Batch combined"
        );
        outputs.push(combined);
        ctx.report(Stage::Reduce { level }, i + 1, total);
    }

    Ok(outputs)
}

/// Reduce `items` until exactly one text remains.
///
/// The pass whose batch covers every remaining item uses
/// `templates.finalize`; all earlier passes use `templates.combine`. A
/// one-element input is returned unchanged with zero LLM calls.
pub async fn reduce_until_singleton<L: Llm + ?Sized>(
    llm: &L,
    items: Vec<String>,
    policy: &ReductionPolicy,
    templates: &PipelineTemplates,
    ctx: &RunContext<'_>,
) -> Result<Reduction> {
    policy.validate()?;
    if items.is_empty() {
        return Err(DigestError::empty("nothing to reduce"));
    }

    let mut current = items;
    let mut level = 0;

    while current.len() > 1 {
        let len = current.len();
        let batch_size = policy.batch_size(level, len).max(2);
        let is_final = batch_size >= len;
        let template = if is_final {
            &templates.finalize
        } else {
            &templates.combine
        };

        info!(
            pipeline = %ctx.pipeline,
            level,
            inputs = len,
            batch_size,
            is_final,
            "Starting reduction pass"
        );

        current = reduce(llm, &current, batch_size, template, level, ctx).await?;
        level += 1;
    }

    let text = current
        .pop()
        .ok_or_else(|| DigestError::empty("reduction produced no output"))?;

    Ok(Reduction {
        text,
        levels: level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::pipeline::context::detached;
    use crate::testing::MockLlm;
    use crate::types::artifact::ArtifactKind;
    use proptest::prelude::*;
    use tokio_util::sync::CancellationToken;

    fn templates() -> PipelineTemplates {
        PipelineTemplates {
            transform: PromptTemplate::new("T:{text}").unwrap(),
            combine: PromptTemplate::new("C[{text}]").unwrap(),
            finalize: PromptTemplate::new("F[{text}]").unwrap(),
        }
    }

    fn strings(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("s{}", i)).collect()
    }

    fn echo() -> MockLlm {
        MockLlm::new().with_responder(|prompt| prompt.replace(BATCH_SEPARATOR, ","))
    }

    #[tokio::test]
    async fn test_reduce_batches_in_order() {
        let llm = echo();
        let cancel = CancellationToken::new();
        let ctx = detached(ArtifactKind::Summary, "m", &cancel);
        let template = PromptTemplate::new("<{text}>").unwrap();

        let out = reduce(&llm, &strings(7), 3, &template, 0, &ctx).await.unwrap();

        // Last batch holds one item and passes through untouched.
        assert_eq!(out, vec!["<s0,s1,s2>", "<s3,s4,s5>", "s6"]);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_single_item_short_circuit() {
        let llm = echo();
        let cancel = CancellationToken::new();
        let ctx = detached(ArtifactKind::Summary, "m", &cancel);

        let reduction = reduce_until_singleton(
            &llm,
            vec!["only".to_string()],
            &ReductionPolicy::default(),
            &templates(),
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(reduction.text, "only");
        assert_eq!(reduction.levels, 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let llm = echo();
        let cancel = CancellationToken::new();
        let ctx = detached(ArtifactKind::Summary, "m", &cancel);

        let result =
            reduce_until_singleton(&llm, vec![], &ReductionPolicy::default(), &templates(), &ctx)
                .await;

        assert!(matches!(result, Err(DigestError::EmptyInput { .. })));
    }

    #[tokio::test]
    async fn test_secondary_pass_shape() {
        // 12 -> (5,5,2) -> 3 -> (2,1) -> 2 -> final -> 1
        let llm = echo();
        let cancel = CancellationToken::new();
        let ctx = detached(ArtifactKind::Summary, "m", &cancel);
        let policy = ReductionPolicy::default().with_level2_batch_size(2);

        let reduction = reduce_until_singleton(&llm, strings(12), &policy, &templates(), &ctx)
            .await
            .unwrap();

        assert_eq!(reduction.levels, 3);
        assert_eq!(
            reduction.text,
            "F[C[C[s0,s1,s2,s3,s4],C[s5,s6,s7,s8,s9]],C[s10,s11]]"
        );
        // 3 level-1 calls, 1 level-2 call (the other batch is a pass-through), 1 final.
        assert_eq!(llm.call_count(), 5);
    }

    #[tokio::test]
    async fn test_small_input_goes_straight_to_final() {
        let llm = echo();
        let cancel = CancellationToken::new();
        let ctx = detached(ArtifactKind::Summary, "m", &cancel);

        let reduction = reduce_until_singleton(
            &llm,
            strings(4),
            &ReductionPolicy::default(),
            &templates(),
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(reduction.text, "F[s0,s1,s2,s3]");
        assert_eq!(reduction.levels, 1);
    }

    #[tokio::test]
    async fn test_combine_failure_aborts() {
        let llm = echo().fail_on_call(2, ModelError::rate_limited("429"));
        let cancel = CancellationToken::new();
        let ctx = detached(ArtifactKind::RiskReport, "m", &cancel);

        let result = reduce_until_singleton(
            &llm,
            strings(12),
            &ReductionPolicy::default(),
            &templates(),
            &ctx,
        )
        .await;

        assert!(matches!(result, Err(DigestError::Model(_))));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_progress_reported_per_batch() {
        use crate::traits::progress::ProgressEvent;
        use std::sync::Mutex;

        let llm = echo();
        let cancel = CancellationToken::new();
        let events = Mutex::new(Vec::new());
        let reporter = |event: ProgressEvent| events.lock().unwrap().push(event);
        let ctx = RunContext::new(ArtifactKind::Summary, "m", &reporter, &cancel);

        reduce_until_singleton(&llm, strings(7), &ReductionPolicy::default(), &templates(), &ctx)
            .await
            .unwrap();

        let seen: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.stage, e.completed, e.total))
            .collect();
        assert_eq!(
            seen,
            vec![
                (Stage::Reduce { level: 0 }, 1, 2),
                (Stage::Reduce { level: 0 }, 2, 2),
                (Stage::Reduce { level: 1 }, 1, 1),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_reduction_terminates_with_one_text(
            len in 1usize..200,
            level1 in 2usize..8,
            level2 in 2usize..6,
            threshold in 1usize..6,
            max_levels in 1usize..6,
        ) {
            let policy = ReductionPolicy {
                level1_batch_size: level1,
                level2_batch_size: level2,
                secondary_pass_threshold: threshold,
                max_levels,
            };
            let llm = MockLlm::new().with_responder(|prompt| prompt.to_string());
            let cancel = CancellationToken::new();
            let ctx = detached(ArtifactKind::Summary, "m", &cancel);
            let identity = PipelineTemplates {
                transform: PromptTemplate::new("{text}").unwrap(),
                combine: PromptTemplate::new("{text}").unwrap(),
                finalize: PromptTemplate::new("{text}").unwrap(),
            };

            let reduction = tokio_test::block_on(
                reduce_until_singleton(&llm, strings(len), &policy, &identity, &ctx)
            ).unwrap();

            prop_assert!(reduction.levels <= max_levels);
            // Identity prompts make order preservation directly visible.
            prop_assert_eq!(reduction.text, strings(len).join(BATCH_SEPARATOR));
        }
    }
}
