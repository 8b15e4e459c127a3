use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied writing {path} (administrator privileges required)")]
    PermissionDenied { path: PathBuf },

    #[error("Process list unavailable: {0}")]
    Snapshot(String),

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{entity} '{name}' not found")]
    NotFound { entity: &'static str, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Monitor thread crashed; restart Guardian to resume monitoring")]
    MonitorCrashed,
}

impl AppError {
    /// Map an I/O failure on a system file, promoting permission errors.
    pub fn from_io(path: &Path, e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::PermissionDenied {
            AppError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            AppError::Io(e)
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AppError::PermissionDenied { .. })
    }
}
