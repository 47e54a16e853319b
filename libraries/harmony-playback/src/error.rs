//! Error types for voice playback sessions

use thiserror::Error;

/// Session-level failures
///
/// None of these escape the public session API: the session converts them
/// into [`PlayerEvent::Error`](crate::PlayerEvent::Error) and keeps running.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Joining the voice channel failed
    #[error("Can't connect to the voice channel: {0}")]
    Connection(String),

    /// The voice connection never reported ready
    #[error("Timed out after {0:?} waiting for the voice connection")]
    ConnectTimeout(std::time::Duration),

    /// Search returned nothing playable
    #[error("No result found for \"{0}\"")]
    NothingFound(String),

    /// Every stream provider failed for this URL
    #[error("No audio stream available for {0}")]
    NoStream(String),

    /// The resource builder rejected the stream
    #[error("Failed to build audio resource: {0}")]
    Resource(String),

    /// The audio sink reported an error
    #[error("Audio player error: {0}")]
    Sink(String),

    /// `previous` without an earlier track
    #[error("No track to go back to")]
    NoPreviousTrack,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stop/disconnect happened while the operation was in flight
    #[error("Operation superseded by stop or disconnect")]
    Superseded,
}

impl PlayerError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a nothing-found error
    pub fn nothing_found(query: impl Into<String>) -> Self {
        Self::NothingFound(query.into())
    }

    /// Create a missing-stream error
    pub fn no_stream(url: impl Into<String>) -> Self {
        Self::NoStream(url.into())
    }

    /// Create a resource error
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Create a sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            PlayerError::nothing_found("lofi beats").to_string(),
            "No result found for \"lofi beats\""
        );
        assert_eq!(
            PlayerError::NoPreviousTrack.to_string(),
            "No track to go back to"
        );
        assert!(PlayerError::ConnectTimeout(Duration::from_secs(20))
            .to_string()
            .contains("20s"));
    }
}
