//! Error types for image generation and editing.

use serde::{Deserialize, Serialize};

/// Maximum length of a remote error message shown to the user.
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Errors that can occur while preparing, sending or interpreting a generation.
#[derive(Debug, thiserror::Error)]
pub enum NanoCanvasError {
    /// Empty prompt or unsupported local file type.
    #[error("{0}")]
    Validation(String),

    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// The call failed below the API layer (aborted, timed out, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response contained no candidates.
    #[error("no candidates returned: {0}")]
    NoCandidate(String),

    /// The first candidate contained no image part.
    #[error("{0}")]
    NoImageReturned(String),

    /// A local resource or payload could not be decoded.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving a download).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse failure taxonomy surfaced to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before reaching the adapter.
    Validation,
    /// The generation call failed at the network or protocol level.
    Transport,
    /// The call succeeded but returned no candidates.
    NoCandidate,
    /// The call succeeded but the first candidate held no image.
    NoImageReturned,
    /// A local file could not be read.
    Decode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Transport => write!(f, "transport"),
            Self::NoCandidate => write!(f, "no_candidate"),
            Self::NoImageReturned => write!(f, "no_image_returned"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

impl NanoCanvasError {
    /// Maps this error onto the session-level taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_)
            | Self::Api { .. }
            | Self::Transport(_)
            | Self::Network(_)
            | Self::Io(_) => ErrorKind::Transport,
            Self::NoCandidate(_) => ErrorKind::NoCandidate,
            // A body that does not parse is treated like a reply without an image.
            Self::NoImageReturned(_) | Self::Json(_) => ErrorKind::NoImageReturned,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Collapses whitespace and truncates a remote error body for display.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    format!("{}...", truncated)
}

/// Result type alias for NanoCanvas operations.
pub type Result<T> = std::result::Result<T, NanoCanvasError>;
