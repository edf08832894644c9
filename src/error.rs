//! Unified error types for relprep
//!
//! Error strategy:
//! - Per-file errors (invalid input, tags, spectrograms): Recoverable, report and continue
//! - Per-content errors (collision skip, torrent build): Recoverable, skip that content path
//! - Profile errors: Fatal to the packaging run that requested the profile
//!
//! Every message names the offending path.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for relprep operations
#[derive(Debug, Error)]
pub enum RelprepError {
    // =========================================================================
    // Recoverable errors - skip item, continue batch
    // =========================================================================
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Failed to read tags from '{path}': {reason}\n  Tip: If the file plays in other apps, its metadata blocks may be damaged")]
    MetadataError { path: PathBuf, reason: String },

    #[error("Failed to decode audio file '{path}': {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Spectrogram failed for '{path}': {reason}")]
    RenderError { path: PathBuf, reason: String },

    #[error("'{path}' already exists, skipped on request")]
    Collision { path: PathBuf },

    #[error("Failed to build torrent for '{path}': {reason}")]
    TorrentError { path: PathBuf, reason: String },

    // =========================================================================
    // Fatal errors - abort the operation
    // =========================================================================
    #[error("Configuration error in '{path}': {reason}")]
    ConfigError { path: PathBuf, reason: String },

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for relprep operations
pub type Result<T> = std::result::Result<T, RelprepError>;

impl RelprepError {
    /// Returns true if this error is recoverable (report the item, continue batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RelprepError::InvalidInput { .. }
                | RelprepError::MetadataError { .. }
                | RelprepError::DecodeError { .. }
                | RelprepError::RenderError { .. }
                | RelprepError::Collision { .. }
                | RelprepError::TorrentError { .. }
        )
    }

    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RelprepError::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn render_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RelprepError::RenderError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RelprepError::ConfigError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            std::io::ErrorKind::AlreadyExists => {
                format!("File already exists: {}", path.display())
            }
            _ => err.to_string(),
        };
        RelprepError::OutputError { path, reason }
    }

    /// Re-target a render-stage error at the track it belongs to
    ///
    /// Decoder and upload failures carry the path they failed on (the track or
    /// the scratch image); the spectrogram field always reports the track.
    pub fn into_render_error(self, track: &std::path::Path) -> Self {
        match self {
            RelprepError::RenderError { reason, .. } => RelprepError::RenderError {
                path: track.to_path_buf(),
                reason,
            },
            RelprepError::DecodeError { reason, .. } => RelprepError::RenderError {
                path: track.to_path_buf(),
                reason: format!("decode failed: {}", reason),
            },
            other => RelprepError::RenderError {
                path: track.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}
