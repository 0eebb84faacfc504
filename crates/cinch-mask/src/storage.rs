//! Offload directory resolution.
//!
//! The masking pass does not decide where a session's files live; a
//! [`HistoryDirResolver`] hands it a base directory and the pass writes
//! offloaded observations under `<base>/observations/`.
//!
//! Sessions use the same layout as the agent session manager:
//!
//! ```text
//! .agents/sessions/
//!   tr-abc123/
//!     manifest.json
//!     observations/
//!       run_shell_command_call-7_1f3a9c2e.txt
//! ```

use std::path::{Path, PathBuf};

/// Sub-directory (under the history directory) holding offloaded observations.
pub const OBSERVATIONS_DIR: &str = "observations";

/// Default root for per-session directories.
pub const DEFAULT_SESSIONS_DIR: &str = ".agents/sessions";

/// Supplies the history directory for the current session or project.
pub trait HistoryDirResolver: Send + Sync {
    /// Base directory for this history's files.
    fn history_dir(&self) -> PathBuf;

    /// Directory offloaded observations are written to.
    fn offload_dir(&self) -> PathBuf {
        self.history_dir().join(OBSERVATIONS_DIR)
    }
}

impl HistoryDirResolver for Path {
    fn history_dir(&self) -> PathBuf {
        self.to_path_buf()
    }
}

impl HistoryDirResolver for PathBuf {
    fn history_dir(&self) -> PathBuf {
        self.clone()
    }
}

/// History directory of a single session: `<sessions_dir>/<trace_id>`.
#[derive(Debug, Clone)]
pub struct SessionHistoryDir {
    sessions_dir: PathBuf,
    trace_id: String,
}

impl SessionHistoryDir {
    pub fn new(sessions_dir: impl Into<PathBuf>, trace_id: impl Into<String>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            trace_id: trace_id.into(),
        }
    }

    /// Session under [`DEFAULT_SESSIONS_DIR`].
    pub fn in_default_root(trace_id: impl Into<String>) -> Self {
        Self::new(DEFAULT_SESSIONS_DIR, trace_id)
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }
}

impl HistoryDirResolver for SessionHistoryDir {
    fn history_dir(&self) -> PathBuf {
        self.sessions_dir.join(&self.trace_id)
    }
}
