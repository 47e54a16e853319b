//! Error types for track providers.

use thiserror::Error;

/// Errors a single provider can hit.
///
/// The chain resolver logs these and moves on to the next provider, so they
/// never reach a session directly.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned {status} for {url}")]
    Status { status: u16, url: String },

    /// External helper process could not run or exited with an error
    #[error("Process error: {0}")]
    Process(String),

    /// Failed to parse provider output
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Provider has nothing for this URL kind
    #[error("Unsupported URL: {0}")]
    Unsupported(String),

    /// IO error while reading a stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolverError {
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn unsupported(url: impl Into<String>) -> Self {
        Self::Unsupported(url.into())
    }
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ResolverError>;
