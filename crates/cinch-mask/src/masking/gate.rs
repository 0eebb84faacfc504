//! Hysteresis gate.
//!
//! Masking only pays off once enough prunable tokens have accumulated.
//! Without a floor, a single observation sitting just past the protection
//! boundary would be masked on one turn and the boundary would shift on the
//! next, producing a pass on nearly every turn for a handful of tokens.

use super::config::MaskingConfig;

/// Whether a pass with `prunable_tokens` prunable tokens should mutate the
/// history.
pub fn should_mask(prunable_tokens: usize, config: &MaskingConfig) -> bool {
    prunable_tokens >= config.hysteresis_threshold
}
