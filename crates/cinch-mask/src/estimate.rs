//! Token estimation for history parts.
//!
//! The masking pass never tokenizes text itself. It asks a
//! [`TokenEstimator`] for the cost of exactly one part at a time: once for
//! every observation it scans, and once for every replacement it writes.
//! Estimators must be deterministic for a given input, otherwise savings
//! figures (and tests) stop being reproducible.

use crate::{MaskingError, Part, ResponsePayload};

/// Default characters per token for the built-in estimator.
///
/// Matches the 4 chars/token proxy the masking pass uses for its preview
/// size, so estimates and truncation limits agree.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;

/// Estimates the token cost of a slice of parts.
pub trait TokenEstimator: Send + Sync {
    /// Estimated tokens for `parts`. Errors abort the masking pass.
    fn estimate(&self, parts: &[Part]) -> Result<usize, MaskingError>;
}

/// Character-ratio estimator: byte length of the part's content divided by
/// a fixed chars-per-token ratio, rounded up.
///
/// Function calls count their name and serialized arguments; function
/// responses count their name and serialized payload.
#[derive(Debug, Clone)]
pub struct CharRatioEstimator {
    chars_per_token: f64,
}

impl CharRatioEstimator {
    /// Create an estimator with a calibrated ratio. Non-positive ratios fall
    /// back to [`DEFAULT_CHARS_PER_TOKEN`].
    pub fn new(chars_per_token: f64) -> Self {
        let chars_per_token = if chars_per_token > 0.0 {
            chars_per_token
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        Self { chars_per_token }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }

    fn part_chars(part: &Part) -> usize {
        match part {
            Part::Text { text } => text.len(),
            Part::FunctionCall { name, args, .. } => name.len() + args.to_string().len(),
            Part::FunctionResponse(fr) => {
                let payload = match &fr.response {
                    ResponsePayload::Text(s) => s.len(),
                    ResponsePayload::Object(map) => {
                        serde_json::to_string(map).map_or(0, |s| s.len())
                    }
                };
                fr.name.len() + payload
            }
        }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, parts: &[Part]) -> Result<usize, MaskingError> {
        let total_chars: usize = parts.iter().map(Self::part_chars).sum();
        Ok((total_chars as f64 / self.chars_per_token).ceil() as usize)
    }
}
