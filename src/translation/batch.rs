/*!
 * Batch processing of translation units.
 *
 * Units are sliced into chunks of `min(requested, max_batch_size)`. Within a
 * chunk every unit is translated concurrently, capped at the backend's
 * declared width; chunks run one after another. A unit that fails is recorded
 * in the error list and leaves its siblings untouched.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio::time::Instant;

use crate::errors::TranslationError;
use crate::resource::{ContentClass, TranslationUnit};
use crate::translation::backend::{BatchError, BatchOptions, BatchResult, BatchStats, TranslationBackend, TranslationRequest};
use crate::translation::core::translate_attempted;

/// Reject anything the backend cannot do before a single request is sent
pub(crate) fn check_capabilities<B>(
    backend: &B,
    units: &[TranslationUnit],
    source_language: &str,
    target_language: &str,
    options: &BatchOptions,
) -> Result<(), TranslationError>
where
    B: TranslationBackend + ?Sized,
{
    let metadata = backend.metadata();
    metadata.check_languages(source_language, target_language)?;

    let mut classes: Vec<ContentClass> = match options.content_class {
        Some(content_class) => vec![content_class],
        None => units.iter().map(|u| u.content_class).collect(),
    };
    classes.sort_by_key(|c| c.as_str());
    classes.dedup();
    for content_class in classes {
        metadata.check_content_class(content_class)?;
    }
    Ok(())
}

/// Translate `units` in capped chunks.
///
/// Returns the units in input order with `target` filled for every success.
/// Validation, capability and language problems fail the whole call before
/// any remote activity; per-unit remote failures end up in `errors`.
pub async fn translate_batch<B>(
    backend: &B,
    units: Vec<TranslationUnit>,
    source_language: &str,
    target_language: &str,
    options: &BatchOptions,
) -> Result<BatchResult, TranslationError>
where
    B: TranslationBackend + ?Sized,
{
    if units.is_empty() {
        return Err(TranslationError::Validation("No translation units to translate".to_string()));
    }
    check_capabilities(backend, &units, source_language, target_language, options)?;

    let metadata = backend.metadata();
    let chunk_size = options
        .batch_size
        .unwrap_or(metadata.max_batch_size)
        .min(metadata.max_batch_size)
        .max(1);
    let width = options
        .max_concurrency
        .filter(|n| *n > 0)
        .unwrap_or(metadata.max_concurrent_requests)
        .max(1);
    let total_chunks = units.len().div_ceil(chunk_size);

    let mut result = BatchResult {
        units: Vec::with_capacity(units.len()),
        stats: BatchStats::default(),
        errors: Vec::new(),
    };

    for (chunk_index, chunk) in units.chunks(chunk_size).enumerate() {
        let started = Instant::now();

        let requests: Vec<(usize, TranslationRequest)> = chunk
            .iter()
            .enumerate()
            .map(|(index, unit)| {
                let mut request = TranslationRequest::for_unit(unit, source_language, target_language);
                if let Some(content_class) = options.content_class {
                    request.content_class = Some(content_class);
                }
                (index, request)
            })
            .collect();

        let mut outcomes = stream::iter(requests)
            .map(|(index, request)| async move { (index, translate_attempted(backend, &request).await) })
            .buffer_unordered(width.min(chunk.len()))
            .collect::<Vec<_>>()
            .await;

        // Completion order is arbitrary; restore input order
        outcomes.sort_by_key(|(index, _)| *index);

        let mut chunk_failures = 0;
        for ((_, outcome), unit) in outcomes.into_iter().zip(chunk) {
            let mut unit = unit.clone();
            match outcome {
                Ok(attempted) => {
                    let response = attempted.value;
                    unit.target = response.translated_text;
                    result.stats.success_count += 1;
                    // Zero attempts means a cache hit: nothing was spent
                    if attempted.attempts > 0 {
                        result.stats.total_tokens += response.token_usage.map_or(0, |usage| usage.total);
                        result.stats.total_cost += response.cost.unwrap_or(0.0);
                    }
                }
                Err(attempted) => {
                    chunk_failures += 1;
                    result.stats.failed_count += 1;
                    result.errors.push(BatchError {
                        unit: unit.key(),
                        text: unit.source.clone(),
                        message: attempted.value.to_string(),
                        kind: attempted.value.kind(),
                        retry_count: attempted.retries(),
                    });
                }
            }
            result.units.push(unit);
        }

        let elapsed = started.elapsed();
        result.stats.total_processing_time += elapsed;

        if chunk_failures > 0 {
            warn!(
                "{}: chunk {}/{} finished with {} failed unit(s)",
                metadata.name,
                chunk_index + 1,
                total_chunks,
                chunk_failures
            );
        } else {
            debug!("{}: chunk {}/{} completed in {:?}", metadata.name, chunk_index + 1, total_chunks, elapsed);
        }
    }

    info!(
        "{}: translated {} of {} units ({} failed)",
        metadata.name,
        result.stats.success_count,
        result.units.len(),
        result.stats.failed_count
    );

    Ok(result)
}
