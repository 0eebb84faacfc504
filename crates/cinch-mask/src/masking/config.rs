//! Configuration for observation masking.
//!
//! Defaults reproduce the standard policy: protect the newest 50k
//! observation tokens, act only when at least 30k tokens are prunable, and
//! keep a 5k-token (20,000 character) head and tail of each masked output.
//!
//! ```ignore
//! let config = MaskingConfig::new()
//!     .with_protection_threshold(80_000)
//!     .exempt_tool("ask_user")
//!     .with_protect_latest_turn(true);
//! ```

use serde::Deserialize;
use std::collections::HashSet;

/// Tokens of the newest observations that are never masked.
pub const DEFAULT_PROTECTION_THRESHOLD: usize = 50_000;

/// Minimum prunable total before a pass mutates anything.
pub const DEFAULT_HYSTERESIS_THRESHOLD: usize = 30_000;

/// Tokens kept from each end of a masked observation.
pub const DEFAULT_PREVIEW_TOKENS: usize = 5_000;

/// Token-to-character proxy used for preview sizing.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Observations shorter than `preview chars × ratio` are left in place.
pub const DEFAULT_MIN_MASK_RATIO: f64 = 2.5;

/// Configuration for an [`ObservationMasker`](super::ObservationMasker).
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MaskingConfig {
    /// Newest observation tokens that stay untouched.
    pub protection_threshold: usize,
    /// Prunable tokens required before any masking happens.
    pub hysteresis_threshold: usize,
    /// Tokens of preview kept from each end of a masked observation.
    pub preview_tokens: usize,
    /// Characters per token for preview sizing.
    pub chars_per_token: usize,
    /// Observations at or below `char_limit() × min_mask_ratio` characters
    /// are offloaded but not rewritten.
    pub min_mask_ratio: f64,
    /// Tools whose observations are neither protected nor prunable.
    pub exempt_tools: HashSet<String>,
    /// Skip the newest turn entirely while scanning.
    pub protect_latest_turn: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            protection_threshold: DEFAULT_PROTECTION_THRESHOLD,
            hysteresis_threshold: DEFAULT_HYSTERESIS_THRESHOLD,
            preview_tokens: DEFAULT_PREVIEW_TOKENS,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            min_mask_ratio: DEFAULT_MIN_MASK_RATIO,
            exempt_tools: HashSet::new(),
            protect_latest_turn: false,
        }
    }
}

impl MaskingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protection_threshold(mut self, tokens: usize) -> Self {
        self.protection_threshold = tokens;
        self
    }

    pub fn with_hysteresis_threshold(mut self, tokens: usize) -> Self {
        self.hysteresis_threshold = tokens;
        self
    }

    pub fn with_preview_tokens(mut self, tokens: usize) -> Self {
        self.preview_tokens = tokens;
        self
    }

    /// Never count or mask observations from this tool.
    pub fn exempt_tool(mut self, name: impl Into<String>) -> Self {
        self.exempt_tools.insert(name.into());
        self
    }

    pub fn with_protect_latest_turn(mut self, protect: bool) -> Self {
        self.protect_latest_turn = protect;
        self
    }

    /// Characters kept from each end of a masked observation.
    pub fn char_limit(&self) -> usize {
        self.preview_tokens * self.chars_per_token
    }

    /// Largest observation (in characters) that is left unmasked.
    pub fn mask_threshold_chars(&self) -> usize {
        (self.char_limit() as f64 * self.min_mask_ratio) as usize
    }

    pub fn is_exempt(&self, tool_name: &str) -> bool {
        self.exempt_tools.contains(tool_name)
    }
}

// ── Toggle ─────────────────────────────────────────────────────────

/// Generic enabled/disabled wrapper for a module configuration.
///
/// When `enabled` is `false` the caller skips the module regardless of the
/// inner config values.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Toggle<T: Default> {
    pub enabled: bool,
    pub config: T,
}

impl<T: Default> Toggle<T> {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            config: T::default(),
        }
    }
}

impl<T: Default> Default for Toggle<T> {
    fn default() -> Self {
        Self {
            enabled: true,
            config: T::default(),
        }
    }
}

/// Masking settings as loaded by a pipeline: an on/off switch plus config.
pub type MaskingSettings = Toggle<MaskingConfig>;
