//! Error type for masking passes.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a masking pass.
///
/// Any error leaves the caller's history untouched; no partially masked
/// history is ever returned.
#[derive(Error, Debug)]
pub enum MaskingError {
    /// The token estimator could not produce a count.
    #[error("token estimation failed: {0}")]
    Estimator(String),

    /// The offload directory could not be created.
    #[error("failed to create offload directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An observation could not be written to its offload file.
    #[error("failed to write offload file {}: {source}", .path.display())]
    WriteOffload {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl MaskingError {
    /// Whether this error came from storage rather than estimation.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            MaskingError::CreateDir { .. } | MaskingError::WriteOffload { .. }
        )
    }
}
