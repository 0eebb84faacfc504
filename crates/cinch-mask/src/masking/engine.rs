//! The masking pass: scan, gate, offload, aggregate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use super::config::MaskingConfig;
use super::gate;
use super::offload::{self, OffloadIdGenerator, RandomIds};
use super::scan::{PrunableRecord, scan_history};
use crate::estimate::TokenEstimator;
use crate::storage::HistoryDirResolver;
use crate::telemetry::{self, MaskingEvent, MaskingTelemetry, NoopTelemetry};
use crate::{ConversationHistory, MaskingError, Part, Turn};

/// Outcome of one masking pass.
#[derive(Debug, Clone)]
pub struct MaskingResult {
    /// The history to use from now on. Untouched turns are shared with the
    /// input history.
    pub history: ConversationHistory,
    /// Number of prunable observations offloaded. Includes observations
    /// that were too small to rewrite.
    pub masked_count: usize,
    /// Estimated tokens removed from the history.
    pub tokens_saved: usize,
}

impl MaskingResult {
    fn unchanged(history: &[Arc<Turn>]) -> Self {
        Self {
            history: history.to_vec(),
            masked_count: 0,
            tokens_saved: 0,
        }
    }
}

/// One prunable record, ready to be written.
struct OffloadPlan<'r> {
    record: &'r PrunableRecord,
    path: PathBuf,
    /// `None` when the observation is too small to rewrite.
    replacement: Option<Part>,
}

/// Runs masking passes over conversation histories.
///
/// Holds no state between calls; each [`mask`](Self::mask) is a function of
/// the given history plus the files it writes.
///
/// # Example
///
/// ```ignore
/// let estimator = CharRatioEstimator::default();
/// let masker = ObservationMasker::new(&estimator, MaskingConfig::default())
///     .with_telemetry(&LoggingTelemetry);
///
/// let history = match masker.mask(&history, &session_dir).await {
///     Ok(result) => result.history,
///     Err(e) => {
///         warn!("Observation masking failed, keeping full history: {e}");
///         history
///     }
/// };
/// ```
pub struct ObservationMasker<'a> {
    config: MaskingConfig,
    estimator: &'a dyn TokenEstimator,
    ids: &'a dyn OffloadIdGenerator,
    telemetry: &'a dyn MaskingTelemetry,
}

impl<'a> ObservationMasker<'a> {
    /// Create a masker with random file-name ids and no telemetry.
    pub fn new(estimator: &'a dyn TokenEstimator, config: MaskingConfig) -> Self {
        Self {
            config,
            estimator,
            ids: &RandomIds,
            telemetry: &NoopTelemetry,
        }
    }

    /// Set the sink that receives a summary after each pass that masks.
    pub fn with_telemetry(mut self, telemetry: &'a dyn MaskingTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Override the source of fallback call ids and file-name suffixes.
    pub fn with_id_generator(mut self, ids: &'a dyn OffloadIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    /// Run one masking pass over `history`.
    ///
    /// Offloaded observations are written under `storage.offload_dir()`.
    /// On error the caller's history is untouched and remains usable;
    /// observation files written before the failure stay on disk.
    pub async fn mask<R>(
        &self,
        history: &[Arc<Turn>],
        storage: &R,
    ) -> Result<MaskingResult, MaskingError>
    where
        R: HistoryDirResolver + ?Sized,
    {
        if history.is_empty() {
            return Ok(MaskingResult::unchanged(history));
        }

        let scan = scan_history(history, &self.config, self.estimator)?;
        debug!(
            "Observation scan: {} prunable record(s), ~{} prunable tokens, ~{} protected",
            scan.records.len(),
            scan.prunable_tokens,
            scan.protected_tokens,
        );

        if scan.records.is_empty() || !gate::should_mask(scan.prunable_tokens, &self.config) {
            debug!(
                "Masking skipped: ~{} prunable tokens (hysteresis threshold {})",
                scan.prunable_tokens, self.config.hysteresis_threshold,
            );
            return Ok(MaskingResult::unchanged(history));
        }

        let offload_dir = storage.offload_dir();
        offload::ensure_offload_dir(&offload_dir).await?;

        let plans = self.plan_offloads(&scan.records, &offload_dir);
        // Let every write settle before reporting the first failure, so the
        // files left on disk do not depend on scheduling.
        join_all(
            plans
                .iter()
                .map(|plan| offload::write_offload(&plan.path, &plan.record.content)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<()>, MaskingError>>()?;

        let masked_count = plans.len();
        let mut working: ConversationHistory = history.to_vec();
        let mut tokens_saved = 0usize;

        for plan in plans {
            let Some(part) = plan.replacement else {
                continue;
            };
            let new_tokens = self.estimator.estimate(std::slice::from_ref(&part))?;
            tokens_saved += plan.record.tokens.saturating_sub(new_tokens);

            let turn = Arc::make_mut(&mut working[plan.record.turn_index]);
            turn.parts[plan.record.part_index] = Arc::new(part);
        }

        let event = MaskingEvent {
            tokens_before: scan.prunable_tokens,
            tokens_after: scan.prunable_tokens.saturating_sub(tokens_saved),
            masked_count,
            total_prunable_tokens: scan.prunable_tokens,
        };
        telemetry::emit(self.telemetry, &event);

        info!(
            "Masked {masked_count} observation(s) into {}, saved ~{tokens_saved} tokens",
            offload_dir.display(),
        );

        Ok(MaskingResult {
            history: working,
            masked_count,
            tokens_saved,
        })
    }

    /// Name each record's offload file and build its replacement part.
    fn plan_offloads<'r>(
        &self,
        records: &'r [PrunableRecord],
        offload_dir: &Path,
    ) -> Vec<OffloadPlan<'r>> {
        records
            .iter()
            .map(|record| {
                let call_id = record
                    .call_id()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.ids.fallback_call_id());
                let file_name =
                    offload::offload_file_name(record.tool_name(), &call_id, &self.ids.suffix());
                let path = offload_dir.join(file_name);

                let replacement = offload::masked_replacement(
                    &record.content,
                    record.tokens,
                    record.tool_name(),
                    &path,
                    &self.config,
                )
                .map(|text| {
                    Part::FunctionResponse(record.response.with_observation(record.slot, text))
                });

                OffloadPlan {
                    record,
                    path,
                    replacement,
                }
            })
            .collect()
    }
}
