//! Convenience re-exports for common `cinch-mask` types.
//!
//! ```ignore
//! use cinch_mask::prelude::*;
//! ```
//!
//! Pulls in the history types, the masker and its config, the built-in
//! estimator, storage resolvers, and telemetry sinks. Pass internals
//! (scanner records, offload helpers) stay in their modules.

// ── History types ───────────────────────────────────────────────────
pub use crate::{
    ConversationHistory, FunctionResponse, MaskingError, OutputKey, Part, PayloadSlot,
    ResponsePayload, Role, Turn,
};

// ── Masking ─────────────────────────────────────────────────────────
pub use crate::estimate::{CharRatioEstimator, TokenEstimator};
pub use crate::masking::{
    MASKED_MARKER, MaskingConfig, MaskingResult, MaskingSettings, ObservationMasker,
    OffloadIdGenerator, RandomIds,
};

// ── Storage and telemetry ───────────────────────────────────────────
pub use crate::storage::{HistoryDirResolver, SessionHistoryDir};
pub use crate::telemetry::{
    FnTelemetry, LoggingTelemetry, MaskingEvent, MaskingTelemetry, NoopTelemetry,
};
