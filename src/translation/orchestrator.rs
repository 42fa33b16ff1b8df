/*!
 * Run orchestration over arbitrary-size unit lists.
 *
 * A run splits units into administrative batches, independent of the
 * backend's own chunking, and hands each to `translate_batch` in turn.
 * Statistics and errors are folded into a running total. Cancellation is
 * polled between administrative batches only: the batch in flight always
 * completes, and units of batches never started are returned untouched.
 */

use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::app_config::RunConfig;
use crate::errors::TranslationError;
use crate::resource::{ContentClass, TranslationUnit};
use crate::translation::backend::{BatchError, BatchOptions, BatchStats, TranslationBackend};
use crate::translation::batch::check_capabilities;

/// Cooperative cancellation flag shared between a run and its controller
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next batch boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the orchestrator can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Snapshot passed to the progress callback after each administrative batch
#[derive(Debug, Clone, PartialEq)]
pub struct RunProgress {
    pub batch_index: usize,
    pub total_batches: usize,
    pub processed_units: usize,
    pub total_units: usize,
    pub failed_units: usize,
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Every input unit in input order; unprocessed units keep an empty target
    pub units: Vec<TranslationUnit>,
    pub stats: BatchStats,
    pub errors: Vec<BatchError>,
    /// Units that went through a backend batch
    pub processed: usize,
    pub cancelled: bool,
}

impl RunReport {
    /// Whether every processed unit was translated and nothing was skipped
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.errors.is_empty() && self.processed == self.units.len()
    }
}

/// Configuration for a run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Units per administrative batch
    pub batch_size: usize,
    /// Options forwarded to every `translate_batch` call
    pub batch_options: BatchOptions,
}

impl OrchestratorConfig {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            batch_options: BatchOptions::default(),
        }
    }

    /// Chunk size requested from the backend
    pub fn backend_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_options.batch_size = Some(batch_size);
        self
    }

    /// Force a content class on every unit
    pub fn content_class(mut self, content_class: ContentClass) -> Self {
        self.batch_options.content_class = Some(content_class);
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new(50)
    }
}

impl From<&RunConfig> for OrchestratorConfig {
    fn from(run: &RunConfig) -> Self {
        Self::new(run.batch_size)
    }
}

/// Drives runs over a backend
#[derive(Debug, Clone, Default)]
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    cancellation: CancellationFlag,
}

impl BatchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Handle that cancels runs of this orchestrator
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run without progress reporting
    pub async fn run(
        &self,
        backend: &dyn TranslationBackend,
        units: Vec<TranslationUnit>,
        source_language: &str,
        target_language: &str,
    ) -> Result<RunReport, TranslationError> {
        self.run_with_progress(backend, units, source_language, target_language, |_| {}).await
    }

    /// Translate `units` batch by batch, calling `progress` after each batch.
    ///
    /// Fails only when the run is rejected before any remote call. Language
    /// and content-class support are checked over every unit up front.
    pub async fn run_with_progress<F>(
        &self,
        backend: &dyn TranslationBackend,
        units: Vec<TranslationUnit>,
        source_language: &str,
        target_language: &str,
        progress: F,
    ) -> Result<RunReport, TranslationError>
    where
        F: Fn(&RunProgress),
    {
        if units.is_empty() {
            return Err(TranslationError::Validation("No translation units to translate".to_string()));
        }
        if self.config.batch_size == 0 {
            return Err(TranslationError::Config("Run batch_size must be greater than zero".to_string()));
        }

        check_capabilities(backend, &units, source_language, target_language, &self.config.batch_options)?;

        let run_id = Uuid::new_v4();
        let total_units = units.len();
        let total_batches = total_units.div_ceil(self.config.batch_size);
        info!(
            "Run {}: {} units in {} batch(es) with {}",
            run_id,
            total_units,
            total_batches,
            backend.metadata().name
        );

        let mut report = RunReport {
            run_id,
            units: Vec::with_capacity(total_units),
            stats: BatchStats::default(),
            errors: Vec::new(),
            processed: 0,
            cancelled: false,
        };

        let mut remaining = units.into_iter();
        for batch_index in 0..total_batches {
            if self.cancellation.is_cancelled() {
                warn!("Run {} cancelled after {} of {} batch(es)", run_id, batch_index, total_batches);
                report.cancelled = true;
                break;
            }

            let batch: Vec<TranslationUnit> = remaining.by_ref().take(self.config.batch_size).collect();
            let batch_len = batch.len();
            let result = backend
                .translate_batch(batch, source_language, target_language, &self.config.batch_options)
                .await?;

            report.stats.absorb(&result.stats);
            report.errors.extend(result.errors);
            report.units.extend(result.units);
            report.processed += batch_len;

            progress(&RunProgress {
                batch_index: batch_index + 1,
                total_batches,
                processed_units: report.processed,
                total_units,
                failed_units: report.stats.failed_count,
            });
        }

        report.units.extend(remaining);

        info!(
            "Run {} finished: {} translated, {} failed, {} untouched",
            run_id,
            report.stats.success_count,
            report.stats.failed_count,
            total_units - report.processed
        );

        Ok(report)
    }
}
