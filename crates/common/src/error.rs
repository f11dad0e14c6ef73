//! Error types shared across Reelsmith crates.

use std::path::PathBuf;

/// Top-level error type for Reelsmith operations.
///
/// The first five variants form the render job taxonomy. Per-asset variants
/// (`AssetUnavailable`, `CorruptAsset`) are absorbed by the resolver and never
/// fail a job on their own; `UploadFailure` only degrades a successful render.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Asset unavailable for clip {clip_id}: {message}")]
    AssetUnavailable { clip_id: String, message: String },

    #[error("Corrupt asset for clip {clip_id}: {message}")]
    CorruptAsset { clip_id: String, message: String },

    #[error("No renderable content: every video clip failed to resolve")]
    NoRenderableContent,

    #[error("Encoder failure: {message}")]
    EncoderFailure {
        message: String,
        /// Bounded tail of the encoder's diagnostic output.
        diagnostics: String,
    },

    #[error("Upload failure: {message}")]
    UploadFailure { message: String },

    #[error("Graph compile error: {message}")]
    Compile { message: String },

    #[error("Timeline validation failed: {message}")]
    Validation { message: String },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Timed out: {what}")]
    Timeout { what: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

/// Maximum number of characters of encoder output surfaced to callers.
pub const MAX_DIAGNOSTIC_CHARS: usize = 2000;

impl ReelError {
    pub fn asset_unavailable(clip_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::AssetUnavailable {
            clip_id: clip_id.into(),
            message: msg.into(),
        }
    }

    pub fn corrupt_asset(clip_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CorruptAsset {
            clip_id: clip_id.into(),
            message: msg.into(),
        }
    }

    pub fn encoder(msg: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::EncoderFailure {
            message: msg.into(),
            diagnostics: bounded_excerpt(&diagnostics.into(), MAX_DIAGNOSTIC_CHARS),
        }
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::UploadFailure {
            message: msg.into(),
        }
    }

    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile {
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout { what: what.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error only affects a single asset and must not fail the job.
    pub fn is_per_asset(&self) -> bool {
        matches!(
            self,
            Self::AssetUnavailable { .. } | Self::CorruptAsset { .. }
        )
    }

    /// Message suitable for display to an end user.
    ///
    /// Encoder failures carry their diagnostic excerpt; nothing here ever
    /// contains more than [`MAX_DIAGNOSTIC_CHARS`] of encoder output.
    pub fn user_message(&self) -> String {
        match self {
            Self::EncoderFailure { diagnostics, .. } if !diagnostics.is_empty() => {
                format!("{self}\n{diagnostics}")
            }
            other => other.to_string(),
        }
    }
}

/// Keep at most `max_chars` characters from the end of `text`.
pub fn bounded_excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - max_chars).collect();
    format!("...{tail}")
}
