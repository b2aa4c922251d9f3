//! Error types for the libvirtApi provider
//!
//! Every failure a reconciler can report to the host tool is one of these
//! variants. The client layer produces `Transport`, `Api` and `Decode`; the
//! reconcilers add `Mismatch`, `NotFound` and `InvalidInput`.

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the libvirtApi provider
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP request could not be completed (connect failure, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote API answered with a non-2xx status
    #[error("status: {status}, body: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A 2xx response body did not have the expected shape
    #[error("Failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded (e.g. "network")
        what: String,
        /// Parser message
        message: String,
    },

    /// A declared value disagrees with the live remote value
    #[error("Bad {attribute}: {live} != {declared}")]
    Mismatch {
        /// Attribute name
        attribute: String,
        /// Value declared in configuration
        declared: String,
        /// Value reported by the remote system
        live: String,
    },

    /// Configuration errors (missing or unknown credentials, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A data-source lookup found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Declared values rejected before any remote call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an error for a non-2xx response
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(what: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Create a consistency-check error
    pub fn mismatch(
        attribute: impl Into<String>,
        declared: impl std::fmt::Display,
        live: impl std::fmt::Display,
    ) -> Self {
        Self::Mismatch {
            attribute: attribute.into(),
            declared: declared.to_string(),
            live: live.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// HTTP status carried by an `Api` error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short summary used as the diagnostic title shown by the host tool
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Unable to reach libvirtApi",
            Self::Api { .. } => "libvirtApi returned an error",
            Self::Decode { .. } => "Unexpected libvirtApi response",
            Self::Mismatch { .. } => "Declared value does not match remote",
            Self::Config(_) => "Invalid provider configuration",
            Self::NotFound(_) => "Resource not found",
            Self::InvalidInput(_) => "Invalid resource configuration",
            Self::StateStore(_) => "State store failure",
            Self::Json(_) => "Invalid JSON",
            Self::Other(_) => "Unexpected error",
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
