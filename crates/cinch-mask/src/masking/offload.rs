//! Offload writer: file naming, the masked replacement text, and the
//! file writes themselves.
//!
//! Every prunable observation is written verbatim to
//! `<offload_dir>/<tool>_<callId-or-timestamp>_<suffix>.txt`. Only
//! observations longer than [`MaskingConfig::mask_threshold_chars`] get a
//! replacement; shorter ones are offloaded but stay in the history as-is.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use super::MASKED_MARKER;
use super::config::MaskingConfig;
use crate::MaskingError;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Opening tag of the guidance block appended to masked observations.
pub const GUIDANCE_OPEN: &str = "<masked_output_guidance>";
/// Closing tag of the guidance block.
pub const GUIDANCE_CLOSE: &str = "</masked_output_guidance>";

// ── Identifiers ────────────────────────────────────────────────────

/// Source of the non-deterministic parts of offload file names.
pub trait OffloadIdGenerator: Send + Sync {
    /// Stand-in call id for payloads without a `callId` field.
    fn fallback_call_id(&self) -> String;
    /// Disambiguating suffix, unique per file.
    fn suffix(&self) -> String;
}

/// Wall-clock fallback ids and random 8-hex-digit suffixes.
pub struct RandomIds;

impl OffloadIdGenerator for RandomIds {
    fn fallback_call_id(&self) -> String {
        chrono::Utc::now().timestamp_millis().to_string()
    }

    fn suffix(&self) -> String {
        uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(8)
            .collect()
    }
}

/// Reduce `raw` to a safe file-name component (`[A-Za-z0-9_-]`).
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// File name for one offloaded observation.
pub fn offload_file_name(tool_name: &str, call_id: &str, suffix: &str) -> String {
    format!(
        "{}_{}_{}.txt",
        sanitize_file_component(tool_name),
        sanitize_file_component(call_id),
        sanitize_file_component(suffix),
    )
}

// ── Replacement text ───────────────────────────────────────────────

/// Size figures reported in the banner and guidance block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationStats {
    pub lines: usize,
    pub bytes: usize,
    pub tokens: usize,
}

impl ObservationStats {
    pub fn of(text: &str, tokens: usize) -> Self {
        Self {
            lines: text.lines().count(),
            bytes: text.len(),
            tokens,
        }
    }

    pub fn mib(&self) -> f64 {
        self.bytes as f64 / BYTES_PER_MIB
    }
}

/// Build the masked replacement for an observation, or `None` when the
/// text is too small to be worth masking.
///
/// The replacement is the masked marker, the first `char_limit` characters,
/// a one-line banner, the last `char_limit` characters, and a guidance block
/// pointing at `offload_path`.
pub fn masked_replacement(
    text: &str,
    tokens: usize,
    tool_name: &str,
    offload_path: &Path,
    config: &MaskingConfig,
) -> Option<String> {
    let char_count = text.chars().count();
    if char_count <= config.mask_threshold_chars() {
        return None;
    }

    let limit = config.char_limit();
    let head: String = text.chars().take(limit).collect();
    let tail: String = text.chars().skip(char_count.saturating_sub(limit)).collect();
    let stats = ObservationStats::of(text, tokens);

    Some(format!(
        "{MASKED_MARKER}\n{head}\n{banner}\n{tail}\n{guidance}",
        banner = banner_line(&stats),
        guidance = guidance_block(tool_name, offload_path, &stats),
    ))
}

fn banner_line(stats: &ObservationStats) -> String {
    format!(
        "... [output truncated: {} lines, {:.2} MiB, ~{} tokens in full] ...",
        stats.lines,
        stats.mib(),
        stats.tokens,
    )
}

fn guidance_block(tool_name: &str, offload_path: &Path, stats: &ObservationStats) -> String {
    format!(
        "{GUIDANCE_OPEN}\n\
         tool: {tool_name}\n\
         file: {path}\n\
         lines: {lines}\n\
         size: {mib:.2} MiB\n\
         estimated_tokens: {tokens}\n\
         Only the head and tail of this output are shown. The full output was saved to the \
         file above; search or read it (for example with grep or read_file) instead of \
         re-running the tool. Reading the whole file costs roughly {tokens} tokens.\n\
         {GUIDANCE_CLOSE}",
        path = offload_path.display(),
        lines = stats.lines,
        mib = stats.mib(),
        tokens = stats.tokens,
    )
}

// ── File writes ────────────────────────────────────────────────────

/// Create the offload directory (and parents) if missing.
pub async fn ensure_offload_dir(dir: &Path) -> Result<(), MaskingError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| MaskingError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

/// Write one observation verbatim (UTF-8, no header).
///
/// The offload directory is append-only: an existing file at `path` is an
/// error, never overwritten.
pub async fn write_offload(path: &Path, content: &str) -> Result<(), MaskingError> {
    let write = async {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    };
    write.await.map_err(|source| MaskingError::WriteOffload {
        path: path.to_path_buf(),
        source,
    })
}
