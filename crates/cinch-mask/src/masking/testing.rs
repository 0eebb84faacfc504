//! Deterministic collaborators for masking tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::offload::OffloadIdGenerator;
use crate::estimate::TokenEstimator;
use crate::telemetry::{MaskingEvent, MaskingTelemetry};
use crate::{MaskingError, Part, ResponsePayload, Turn};

/// One token per character of observation text; zero for other parts.
#[derive(Default)]
pub struct TextLenEstimator {
    calls: AtomicUsize,
    /// Calls allowed to succeed before every later one fails.
    succeed_calls: Option<usize>,
}

impl TextLenEstimator {
    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    pub fn failing_after(calls: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed_calls: Some(calls),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenEstimator for TextLenEstimator {
    fn estimate(&self, parts: &[Part]) -> Result<usize, MaskingError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed_calls.is_some_and(|limit| previous >= limit) {
            return Err(MaskingError::Estimator("estimator offline".into()));
        }
        Ok(parts
            .iter()
            .filter_map(|p| p.as_function_response())
            .filter_map(|fr| fr.observation())
            .map(|(_, text)| text.chars().count())
            .sum())
    }
}

/// Fixed fallback call id and `s0`, `s1`, … suffixes.
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

pub const FALLBACK_CALL_ID: &str = "1700000000000";

impl OffloadIdGenerator for SequentialIds {
    fn fallback_call_id(&self) -> String {
        FALLBACK_CALL_ID.to_string()
    }

    fn suffix(&self) -> String {
        format!("s{}", self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Records every event it receives.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<MaskingEvent>>,
    fail: bool,
}

impl RecordingTelemetry {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<MaskingEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl MaskingTelemetry for RecordingTelemetry {
    fn record(&self, event: &MaskingEvent) -> Result<(), String> {
        self.events.lock().unwrap().push(*event);
        if self.fail {
            Err("sink unavailable".into())
        } else {
            Ok(())
        }
    }
}

/// A `shell`-style observation of `tokens` characters under `output`.
pub fn observation(tool: &str, tokens: usize) -> Part {
    Part::function_response(tool, ResponsePayload::output("x".repeat(tokens)))
}

pub fn user_text(text: &str) -> Turn {
    Turn::user([Part::text(text)])
}
