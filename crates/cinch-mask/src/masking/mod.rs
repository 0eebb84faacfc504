//! Observation masking: offload old tool outputs and leave previews behind.
//!
//! A pass runs four stages, in order:
//!
//! 1. **[`scan`]** walks the history newest to oldest. The newest
//!    observation tokens up to the protection threshold (50k by default) are
//!    protected; the observation that crosses the threshold and everything
//!    older is prunable.
//!
//! 2. **[`gate`]** stops the pass unless at least the hysteresis threshold
//!    (30k by default) of prunable tokens has accumulated. A stopped pass
//!    touches nothing: no files, no telemetry.
//!
//! 3. **[`offload`]** writes every prunable observation to
//!    `<history-dir>/observations/` and replaces the large ones with a
//!    head/tail preview plus a pointer to the file.
//!
//! 4. **[`ObservationMasker`]** assembles the new history, sums the tokens
//!    saved, and reports a [`MaskingEvent`](crate::telemetry::MaskingEvent).
//!
//! Masked observations start with [`MASKED_MARKER`] and are ignored by
//! later passes, so running the masker on its own output is a no-op for
//! anything it already handled.

pub mod config;
pub mod engine;
pub mod gate;
pub mod offload;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;

/// Marker opening every masked observation.
pub const MASKED_MARKER: &str = "<tool_output_masked>";

pub use config::{MaskingConfig, MaskingSettings, Toggle};
pub use engine::{MaskingResult, ObservationMasker};
pub use offload::{OffloadIdGenerator, RandomIds};
pub use scan::{PrunableRecord, ScanOutcome, is_masked, scan_history};
