//! Asset-level errors, mapped onto clip errors by the resolver.

use std::path::PathBuf;

use reelsmith_common::ReelError;

/// Errors that can occur while fetching or storing one asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported asset reference: {0}")]
    UnsupportedReference(String),

    #[error("No object store configured for key {0}")]
    NoObjectStore(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the owning clip, yielding the job-level error kind.
    pub fn for_clip(self, clip_id: &str) -> ReelError {
        match self {
            AssetError::Rejected(message) => ReelError::corrupt_asset(clip_id, message),
            other => ReelError::asset_unavailable(clip_id, other.to_string()),
        }
    }
}
