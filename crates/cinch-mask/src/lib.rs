//! Observation masking for LLM agent conversation histories.
//!
//! Tool outputs ("observations") are the largest consumers of an agent's
//! context window. `cinch-mask` provides a deterministic pass that walks a
//! conversation history from newest to oldest, protects the most recent
//! observation tokens, and offloads everything older to plain-text files on
//! disk. Large offloaded observations are replaced in the history with a
//! head/tail preview and a pointer to the file, so the model can read the
//! full output back on demand.
//!
//! # Getting started
//!
//! ```ignore
//! use cinch_mask::prelude::*;
//!
//! let estimator = CharRatioEstimator::default();
//! let masker = ObservationMasker::new(&estimator, MaskingConfig::default())
//!     .with_telemetry(&LoggingTelemetry);
//!
//! let result = masker.mask(&history, Path::new(".agents/sessions/tr-1")).await?;
//! println!(
//!     "masked {} observation(s), saved ~{} tokens",
//!     result.masked_count, result.tokens_saved
//! );
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`masking`] | [`ObservationMasker`](masking::ObservationMasker), scanner, hysteresis gate, offload writer |
//! | [`estimate`] | [`TokenEstimator`](estimate::TokenEstimator) trait and a character-ratio default |
//! | [`storage`] | Offload directory resolution (plain paths and per-session directories) |
//! | [`telemetry`] | [`MaskingTelemetry`](telemetry::MaskingTelemetry) sinks for masking summaries |
//! | [`error`] | [`MaskingError`](error::MaskingError) |

pub mod error;
pub mod estimate;
pub mod masking;
pub mod prelude;
pub mod storage;
pub mod telemetry;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use error::MaskingError;

// ── History types ──────────────────────────────────────────────────

/// A conversation history, oldest turn first.
///
/// Turns and parts are reference-counted so a masking pass can return a new
/// history that shares every untouched turn with the caller's.
pub type ConversationHistory = Vec<Arc<Turn>>;

/// Role of a turn in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// A single turn: a role plus its ordered parts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Arc<Part>>,
}

impl Turn {
    pub fn new(role: Role, parts: impl IntoIterator<Item = Part>) -> Self {
        Self {
            role,
            parts: parts.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn user(parts: impl IntoIterator<Item = Part>) -> Self {
        Self::new(Role::User, parts)
    }

    pub fn model(parts: impl IntoIterator<Item = Part>) -> Self {
        Self::new(Role::Model, parts)
    }
}

/// One fragment of a turn.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text from the user or the model.
    Text { text: String },
    /// A tool invocation requested by the model.
    FunctionCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        #[serde(default)]
        args: serde_json::Value,
    },
    /// The output of a tool invocation (an observation).
    FunctionResponse(FunctionResponse),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Part::FunctionCall {
            id: None,
            name: name.into(),
            args,
        }
    }

    pub fn function_response(name: impl Into<String>, response: ResponsePayload) -> Self {
        Part::FunctionResponse(FunctionResponse {
            id: None,
            name: name.into(),
            response,
        })
    }

    /// The tool-observation payload, if this part is one.
    pub fn as_function_response(&self) -> Option<&FunctionResponse> {
        match self {
            Part::FunctionResponse(fr) => Some(fr),
            _ => None,
        }
    }
}

/// A tool response embedded in the history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: ResponsePayload,
}

impl FunctionResponse {
    /// The observation text and the slot it was read from.
    pub fn observation(&self) -> Option<(PayloadSlot, &str)> {
        self.response.observation()
    }

    /// A copy of this response with `text` written into `slot`.
    pub fn with_observation(&self, slot: PayloadSlot, text: String) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            response: self.response.with_observation(slot, text),
        }
    }
}

// ── Response payloads ──────────────────────────────────────────────

/// Keys that may carry a tool's text output, in lookup priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKey {
    Output,
    Result,
    Stdout,
    Content,
}

impl OutputKey {
    /// All recognized keys, highest priority first.
    pub const PRIORITY: [OutputKey; 4] = [
        OutputKey::Output,
        OutputKey::Result,
        OutputKey::Stdout,
        OutputKey::Content,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputKey::Output => "output",
            OutputKey::Result => "result",
            OutputKey::Stdout => "stdout",
            OutputKey::Content => "content",
        }
    }
}

/// Where in a [`ResponsePayload`] the observation text lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadSlot {
    /// The payload itself is the text.
    Bare,
    /// The text is the value of a recognized key.
    Key(OutputKey),
}

/// A tool response payload: either a bare string or a JSON object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ResponsePayload {
    Text(String),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl ResponsePayload {
    pub fn text(text: impl Into<String>) -> Self {
        ResponsePayload::Text(text.into())
    }

    /// An object payload holding `text` under `key`.
    pub fn keyed(key: OutputKey, text: impl Into<String>) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(key.as_str().to_string(), serde_json::Value::String(text.into()));
        ResponsePayload::Object(map)
    }

    /// Shorthand for `keyed(OutputKey::Output, text)`.
    pub fn output(text: impl Into<String>) -> Self {
        Self::keyed(OutputKey::Output, text)
    }

    /// Add or replace an arbitrary field. No-op on bare string payloads.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let ResponsePayload::Object(ref mut map) = self {
            map.insert(key.into(), value);
        }
        self
    }

    /// Extract the observation text.
    ///
    /// Bare strings are returned as-is. Objects are searched for the first
    /// recognized key (see [`OutputKey::PRIORITY`]) holding a string; other
    /// value types under a recognized key are skipped.
    pub fn observation(&self) -> Option<(PayloadSlot, &str)> {
        match self {
            ResponsePayload::Text(s) => Some((PayloadSlot::Bare, s.as_str())),
            ResponsePayload::Object(map) => OutputKey::PRIORITY.iter().find_map(|key| {
                map.get(key.as_str())
                    .and_then(|v| v.as_str())
                    .map(|s| (PayloadSlot::Key(*key), s))
            }),
        }
    }

    /// The `callId` field of an object payload, if it is a string.
    pub fn call_id(&self) -> Option<&str> {
        match self {
            ResponsePayload::Object(map) => map.get("callId").and_then(|v| v.as_str()),
            ResponsePayload::Text(_) => None,
        }
    }

    /// A copy with `text` written into `slot`; all other fields are kept.
    pub fn with_observation(&self, slot: PayloadSlot, text: String) -> Self {
        match (self, slot) {
            (ResponsePayload::Object(map), PayloadSlot::Key(key)) => {
                let mut map = map.clone();
                map.insert(key.as_str().to_string(), serde_json::Value::String(text));
                ResponsePayload::Object(map)
            }
            (ResponsePayload::Object(map), PayloadSlot::Bare) => {
                let mut map = map.clone();
                map.insert(
                    OutputKey::Output.as_str().to_string(),
                    serde_json::Value::String(text),
                );
                ResponsePayload::Object(map)
            }
            (ResponsePayload::Text(_), _) => ResponsePayload::Text(text),
        }
    }
}
