//! History scanner: one backward pass that splits observations into a
//! protected recency window and a prunable tail.
//!
//! Walking newest to oldest, observation tokens accumulate into a running
//! total. The observation that pushes the total past the protection
//! threshold is the first prunable one; everything older is prunable too.
//! Masked observations, exempt tools, and payloads without recognizable
//! text are skipped and do not count toward either side.

use std::sync::Arc;

use super::MASKED_MARKER;
use super::config::MaskingConfig;
use crate::estimate::TokenEstimator;
use crate::{FunctionResponse, MaskingError, PayloadSlot, Turn};

/// An observation selected for masking.
#[derive(Debug, Clone, PartialEq)]
pub struct PrunableRecord {
    pub turn_index: usize,
    pub part_index: usize,
    /// Estimated tokens of the single part.
    pub tokens: usize,
    /// The full observation text.
    pub content: String,
    /// Where the text lives in the response payload.
    pub slot: PayloadSlot,
    /// The response the observation was read from. Its replacement is
    /// rebuilt from this, so every record can be rewritten.
    pub response: FunctionResponse,
}

impl PrunableRecord {
    pub fn tool_name(&self) -> &str {
        &self.response.name
    }

    /// The `callId` carried in the response payload, if any.
    pub fn call_id(&self) -> Option<&str> {
        self.response.response.call_id()
    }
}

/// Result of scanning a history.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Prunable records, newest first.
    pub records: Vec<PrunableRecord>,
    /// Sum of `tokens` over `records`.
    pub prunable_tokens: usize,
    /// Tokens inside the protection window.
    pub protected_tokens: usize,
}

/// Whether observation text already carries the masked marker.
pub fn is_masked(text: &str) -> bool {
    text.starts_with(MASKED_MARKER)
}

/// Scan `history` and collect prunable observations.
///
/// Calls the estimator once per qualifying observation; an empty history
/// returns immediately without estimating anything.
pub fn scan_history(
    history: &[Arc<Turn>],
    config: &MaskingConfig,
    estimator: &dyn TokenEstimator,
) -> Result<ScanOutcome, MaskingError> {
    let mut outcome = ScanOutcome::default();
    if history.is_empty() {
        return Ok(outcome);
    }

    let scan_end = if config.protect_latest_turn {
        history.len() - 1
    } else {
        history.len()
    };

    let mut seen_tokens = 0usize;
    let mut boundary_reached = false;

    for turn_index in (0..scan_end).rev() {
        let turn = &history[turn_index];
        for part_index in (0..turn.parts.len()).rev() {
            let part = &turn.parts[part_index];
            let Some(fr) = part.as_function_response() else {
                continue;
            };
            if config.is_exempt(&fr.name) {
                continue;
            }
            let Some((slot, text)) = fr.observation() else {
                continue;
            };
            if text.is_empty() || is_masked(text) {
                continue;
            }

            let tokens = estimator.estimate(std::slice::from_ref(part.as_ref()))?;

            if !boundary_reached {
                seen_tokens += tokens;
                if seen_tokens <= config.protection_threshold {
                    outcome.protected_tokens += tokens;
                    continue;
                }
                boundary_reached = true;
            }

            outcome.prunable_tokens += tokens;
            outcome.records.push(PrunableRecord {
                turn_index,
                part_index,
                tokens,
                content: text.to_string(),
                slot,
                response: fr.clone(),
            });
        }
    }

    Ok(outcome)
}
