//! Session Events
//!
//! Every state change a session makes is announced as a [`PlayerEvent`] on a
//! broadcast channel. Hosts subscribe with
//! [`MusicPlayer::subscribe`](crate::MusicPlayer::subscribe) and relay the events
//! to users. Events are sent only after the state they describe is committed.

use crate::types::TrackMetadata;
use serde::{Deserialize, Serialize};

/// Events emitted by a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// A track started playing
    Start {
        metadata: TrackMetadata,
        /// Queue after the start
        queue: Vec<TrackMetadata>,
    },

    /// A track was appended while another was playing
    QueueAdd {
        metadata: TrackMetadata,
        queue: Vec<TrackMetadata>,
    },

    Pause,

    Resume,

    /// Playback stopped and queue/history cleared
    Stop,

    /// The current track is being skipped
    Skip {
        queue: Vec<TrackMetadata>,
        history: Vec<String>,
    },

    /// Going back to the previous track
    Previous {
        /// The track about to play
        metadata: TrackMetadata,
        queue: Vec<TrackMetadata>,
        history: Vec<String>,
    },

    /// Queue shuffled or shuffle undone
    Shuffle { queue: Vec<TrackMetadata> },

    LoopQueue { enabled: bool },

    LoopTrack { enabled: bool },

    /// Volume changed
    VolumeChange {
        /// New volume in percent (0-200)
        volume: u32,
    },

    /// Nothing left to play
    Finish {
        queue: Vec<TrackMetadata>,
        history: Vec<String>,
    },

    /// The session left the voice channel
    Disconnect,

    /// A recoverable error; the session keeps running
    Error { message: String },
}

impl PlayerEvent {
    /// Short event name, matching the serialized `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::Start { .. } => "start",
            PlayerEvent::QueueAdd { .. } => "queueAdd",
            PlayerEvent::Pause => "pause",
            PlayerEvent::Resume => "resume",
            PlayerEvent::Stop => "stop",
            PlayerEvent::Skip { .. } => "skip",
            PlayerEvent::Previous { .. } => "previous",
            PlayerEvent::Shuffle { .. } => "shuffle",
            PlayerEvent::LoopQueue { .. } => "loopQueue",
            PlayerEvent::LoopTrack { .. } => "loopTrack",
            PlayerEvent::VolumeChange { .. } => "volumeChange",
            PlayerEvent::Finish { .. } => "finish",
            PlayerEvent::Disconnect => "disconnect",
            PlayerEvent::Error { .. } => "error",
        }
    }
}

impl From<crate::error::PlayerError> for PlayerEvent {
    fn from(err: crate::error::PlayerError) -> Self {
        PlayerEvent::Error {
            message: err.to_string(),
        }
    }
}
