//! Run one observation-masking pass over a conversation history file.
//!
//! Reads a JSON array of turns, offloads prunable tool outputs into the
//! session's `observations/` directory, and writes the masked history as
//! JSON. If masking fails the history is written back unmasked.
//!
//! # Examples
//!
//! ```sh
//! # Mask into an explicit history directory, print to stdout
//! cinch-mask --history history.json --history-dir .agents/sessions/tr-abc
//!
//! # Resolve the directory from a session trace id, write to a file
//! cinch-mask --history history.json --trace-id tr-abc --output masked.json
//!
//! # Override thresholds from a settings file
//! cinch-mask --history history.json --trace-id tr-abc --config masking.json
//! ```
//!
//! A settings file looks like:
//!
//! ```json
//! { "enabled": true, "config": { "protection_threshold": 80000, "exempt_tools": ["ask_user"] } }
//! ```

use std::path::{Path, PathBuf};
use std::process;

use cinch_mask::prelude::*;
use cinch_mask::storage::DEFAULT_SESSIONS_DIR;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run one observation-masking pass over a conversation history file.
#[derive(Parser)]
#[command(name = "cinch-mask")]
struct Cli {
    // ── Input / output ─────────────────────────────────────────
    /// Path to the history JSON (an array of turns)
    #[arg(long)]
    history: PathBuf,

    /// Write the masked history here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Masking settings JSON (`enabled` plus `config` overrides)
    #[arg(long)]
    config: Option<PathBuf>,

    // ── Storage ────────────────────────────────────────────────
    /// History directory; offloaded observations go to <dir>/observations
    #[arg(long, conflicts_with = "trace_id")]
    history_dir: Option<PathBuf>,

    /// Session trace id, resolved under --sessions-dir
    #[arg(long)]
    trace_id: Option<String>,

    /// Root of per-session directories
    #[arg(long, default_value = DEFAULT_SESSIONS_DIR)]
    sessions_dir: PathBuf,

    // ── Estimation ─────────────────────────────────────────────
    /// Characters per token for the built-in estimator
    #[arg(long, default_value_t = cinch_mask::estimate::DEFAULT_CHARS_PER_TOKEN)]
    chars_per_token: f64,

    // ── Reporting ──────────────────────────────────────────────
    /// Print the masking summary as a JSON line on stderr
    #[arg(long)]
    summary_json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let settings = load_settings(cli.config.as_deref())?;
    let history = read_history(&cli.history)?;

    let storage: Box<dyn HistoryDirResolver> = match (cli.history_dir, cli.trace_id) {
        (Some(dir), _) => Box::new(dir),
        (None, Some(trace_id)) => Box::new(SessionHistoryDir::new(cli.sessions_dir, trace_id)),
        (None, None) => return Err("either --history-dir or --trace-id is required".into()),
    };

    if !settings.enabled {
        info!("Observation masking disabled by settings; history passed through");
        return write_history(&history, cli.output.as_deref());
    }

    let estimator = CharRatioEstimator::new(cli.chars_per_token);
    let json_summary = FnTelemetry::new(|event: &MaskingEvent| {
        let line = serde_json::to_string(event).map_err(|e| e.to_string())?;
        eprintln!("{line}");
        Ok(())
    });
    let telemetry: &dyn MaskingTelemetry = if cli.summary_json {
        &json_summary
    } else {
        &LoggingTelemetry
    };

    let masker = ObservationMasker::new(&estimator, settings.config).with_telemetry(telemetry);

    let outcome = masker.mask(&history, &*storage).await;
    let masked = match outcome {
        Ok(result) => {
            if result.masked_count == 0 {
                info!("No observations masked");
            }
            result.history
        }
        Err(e) => {
            let stage = if e.is_io() { "storage" } else { "estimation" };
            warn!("Masking failed during {stage}; writing history unmasked: {e}");
            history
        }
    };

    write_history(&masked, cli.output.as_deref())
}

fn load_settings(path: Option<&Path>) -> Result<MaskingSettings, String> {
    let Some(path) = path else {
        return Ok(MaskingSettings::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read settings {}: {e}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|e| format!("failed to parse settings {}: {e}", path.display()))
}

fn read_history(path: &Path) -> Result<ConversationHistory, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read history {}: {e}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|e| format!("failed to parse history {}: {e}", path.display()))
}

fn write_history(history: &ConversationHistory, output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(history)
        .map_err(|e| format!("failed to serialize history: {e}"))?;
    match output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("failed to write {}: {e}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_dir_and_trace_id_are_exclusive() {
        let err = Cli::try_parse_from([
            "cinch-mask",
            "--history",
            "h.json",
            "--history-dir",
            "out",
            "--trace-id",
            "tr-1",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn trace_id_alone_uses_default_sessions_dir() {
        let cli = Cli::try_parse_from(["cinch-mask", "--history", "h.json", "--trace-id", "tr-1"])
            .unwrap();
        assert_eq!(cli.trace_id.as_deref(), Some("tr-1"));
        assert!(cli.history_dir.is_none());
        assert_eq!(cli.sessions_dir, PathBuf::from(DEFAULT_SESSIONS_DIR));
    }
}
