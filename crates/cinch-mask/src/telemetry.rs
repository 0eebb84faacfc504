//! Telemetry sinks for masking summaries.
//!
//! A completed masking pass reports one [`MaskingEvent`] to the sink passed
//! to the [`ObservationMasker`](crate::masking::ObservationMasker). Sinks
//! are observers only: a failing sink is logged and ignored, it never changes
//! the masking result.
//!
//! # Choosing a sink
//!
//! | Sink | Use case |
//! |------|----------|
//! | [`NoopTelemetry`] | Default; tests or callers without metrics |
//! | [`LoggingTelemetry`] | Structured logging via `tracing` |
//! | [`FnTelemetry`] | Quick closures (counters, channels, test recorders) |
//! | Custom `impl MaskingTelemetry` | Forwarding to a metrics backend |

use serde::Serialize;
use tracing::{info, warn};

/// Summary of one masking pass.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingEvent {
    /// Estimated tokens of the prunable observations before masking.
    pub tokens_before: usize,
    /// `tokens_before` minus the tokens saved by masking.
    pub tokens_after: usize,
    /// Number of prunable records processed (offloaded).
    pub masked_count: usize,
    /// Total estimated tokens of all prunable observations.
    pub total_prunable_tokens: usize,
}

/// Receives masking summaries.
///
/// The default implementation accepts and discards every event.
pub trait MaskingTelemetry: Send + Sync {
    /// Record one event. Errors are logged by the caller and never surfaced.
    fn record(&self, event: &MaskingEvent) -> Result<(), String> {
        let _ = event;
        Ok(())
    }
}

/// A sink that discards every event.
pub struct NoopTelemetry;
impl MaskingTelemetry for NoopTelemetry {}

/// A sink that logs events via `tracing`.
pub struct LoggingTelemetry;

impl MaskingTelemetry for LoggingTelemetry {
    fn record(&self, event: &MaskingEvent) -> Result<(), String> {
        info!(
            "Masked {} observation(s): ~{} -> ~{} tokens ({} prunable)",
            event.masked_count, event.tokens_before, event.tokens_after, event.total_prunable_tokens,
        );
        Ok(())
    }
}

/// A sink backed by a closure.
///
/// ```ignore
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let s = seen.clone();
/// let sink = FnTelemetry::new(move |event| {
///     s.lock().unwrap().push(*event);
///     Ok(())
/// });
/// ```
pub struct FnTelemetry<F>(F)
where
    F: Fn(&MaskingEvent) -> Result<(), String> + Send + Sync;

impl<F> FnTelemetry<F>
where
    F: Fn(&MaskingEvent) -> Result<(), String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> MaskingTelemetry for FnTelemetry<F>
where
    F: Fn(&MaskingEvent) -> Result<(), String> + Send + Sync,
{
    fn record(&self, event: &MaskingEvent) -> Result<(), String> {
        (self.0)(event)
    }
}

/// Forward `event` to `sink`, logging (and dropping) any failure.
pub(crate) fn emit(sink: &dyn MaskingTelemetry, event: &MaskingEvent) {
    if let Err(e) = sink.record(event) {
        warn!("Masking telemetry sink failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn sample() -> MaskingEvent {
        MaskingEvent {
            tokens_before: 80_000,
            tokens_after: 60_000,
            masked_count: 2,
            total_prunable_tokens: 80_000,
        }
    }

    #[test]
    fn fn_telemetry_receives_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let sink = FnTelemetry::new(move |event| {
            s.lock().unwrap().push(*event);
            Ok(())
        });

        emit(&sink, &sample());
        assert_eq!(seen.lock().unwrap().as_slice(), &[sample()]);
    }

    #[test]
    fn failing_sink_is_swallowed() {
        let sink = FnTelemetry::new(|_| Err("metrics backend down".into()));
        // Must not panic or propagate.
        emit(&sink, &sample());
    }

    #[test]
    fn builtin_sinks_accept_events() {
        assert!(NoopTelemetry.record(&sample()).is_ok());
        assert!(LoggingTelemetry.record(&sample()).is_ok());
    }

    #[test]
    fn event_serializes_with_snake_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["tokens_before"], 80_000);
        assert_eq!(json["masked_count"], 2);
    }
}
