//! Core types for voice playback sessions

use serde::{Deserialize, Serialize};

/// Track information carried through queue, events and history
///
/// Every field except `url` and `source` is optional. A missing field means
/// the resolver could not find it, not that playback failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,

    /// Uploader or artist name
    pub author: Option<String>,

    /// Duration in seconds
    pub duration: Option<u64>,

    /// Thumbnail or artwork URL
    pub thumbnail: Option<String>,

    /// Platform the track came from
    pub source: TrackSource,

    /// Canonical playable URL
    pub url: String,
}

impl TrackMetadata {
    /// Placeholder record used when every metadata provider failed
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            title: None,
            author: None,
            duration: None,
            thumbnail: None,
            source: TrackSource::Unknown,
            url: url.into(),
        }
    }

    /// True when this record carries no resolved metadata
    pub fn is_placeholder(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.duration.is_none()
            && self.thumbnail.is_none()
    }
}

/// Platform a track was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    Youtube,
    Soundcloud,
    Spotify,
    Deezer,
    #[default]
    Unknown,
}

/// Voice channel a session plays into
///
/// The transport adapter for the guild is the session's
/// [`VoiceConnector`](crate::VoiceConnector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceChannel {
    /// Voice channel id
    pub id: u64,

    /// Guild (parent group) id
    pub guild_id: u64,
}

impl VoiceChannel {
    pub fn new(id: u64, guild_id: u64) -> Self {
        Self { id, guild_id }
    }
}
