//! Incremental classification of the library.
//!
//! Pending work is recomputed from disk on every run: a record is pending
//! while its `tags` are empty. The library is saved after every batch, so an
//! interrupted run loses at most one batch of work.

use crate::store::LibraryStore;
use promptlib_common::{PromptlibError, Result};
use promptlib_config::ClassifierConfig;
use promptlib_llm::classifier::classify_batch;
use promptlib_llm::traits::LlmClient;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub max_prompt_chars: usize,
}

impl From<&ClassifierConfig> for ClassifyOptions {
    fn from(cfg: &ClassifierConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            batch_delay: Duration::from_secs(cfg.batch_delay_secs),
            rate_limit_cooldown: Duration::from_secs(cfg.rate_limit_cooldown_secs),
            max_prompt_chars: cfg.max_prompt_chars,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifyStats {
    pub total: usize,
    pub pending: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub classified: usize,
}

/// Classify every pending record of the stored library, batch by batch.
///
/// A failed batch is logged and skipped; its records stay pending for the
/// next run. Only I/O errors on the library file abort the loop.
pub async fn classify_library(
    store: &LibraryStore,
    client: &dyn LlmClient,
    opts: &ClassifyOptions,
) -> Result<ClassifyStats> {
    let mut library = store.load()?;
    let pending: Vec<usize> = library.pending().map(|(i, _)| i).collect();
    let batch_size = opts.batch_size.max(1);

    let mut stats = ClassifyStats {
        total: library.prompts.len(),
        pending: pending.len(),
        batches: pending.len().div_ceil(batch_size),
        ..Default::default()
    };
    tracing::info!(total = stats.total, pending = stats.pending, model = client.model_name(), "classify.start");
    if pending.is_empty() {
        return Ok(stats);
    }

    for (n, chunk) in pending.chunks(batch_size).enumerate() {
        let batch_no = n + 1;
        let prompts: Vec<String> = chunk
            .iter()
            .map(|&i| library.prompts[i].prompt.clone())
            .collect();

        let mut pause = opts.batch_delay;
        match classify_batch(client, &prompts, opts.max_prompt_chars).await {
            Ok(results) => {
                let mut written = 0;
                for c in results {
                    let Some(&idx) = c.id.checked_sub(1).and_then(|pos| chunk.get(pos)) else {
                        tracing::debug!(batch = batch_no, id = c.id, "classify.id_out_of_range");
                        continue;
                    };
                    // An empty tag list would look pending again next run.
                    if c.tags.is_empty() {
                        tracing::debug!(batch = batch_no, id = c.id, "classify.untagged_entry");
                        continue;
                    }
                    let record = &mut library.prompts[idx];
                    if !record.is_pending() {
                        continue;
                    }
                    record.tags = c.tags;
                    record.quality_score = c.quality_score;
                    record.summary = c.summary;
                    written += 1;
                }
                stats.classified += written;
                tracing::info!(batch = batch_no, of = stats.batches, size = chunk.len(), written, "classify.batch.ok");
            }
            Err(PromptlibError::RateLimited) => {
                stats.failed_batches += 1;
                pause = pause.max(opts.rate_limit_cooldown);
                tracing::warn!(
                    batch = batch_no,
                    cooldown_secs = opts.rate_limit_cooldown.as_secs(),
                    "classify.batch.rate_limited"
                );
            }
            Err(e) => {
                stats.failed_batches += 1;
                tracing::warn!(batch = batch_no, error = %e, "classify.batch.failed");
            }
        }

        store.save(&library)?;

        if batch_no < stats.batches && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    tracing::info!(
        classified = stats.classified,
        failed_batches = stats.failed_batches,
        "classify.done"
    );
    Ok(stats)
}
