//! Collaborator traits
//!
//! A session drives four external pieces: the voice transport, the audio sink,
//! the track resolver and the stream source. Each is abstracted behind a trait
//! so the session works with any voice library and any set of providers.

use crate::error::Result;
use crate::types::{TrackMetadata, VoiceChannel};
use crate::volume::{InlineVolume, VolumeControl};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

/// Raw audio bytes from a stream provider
pub type AudioStream = Box<dyn AsyncRead + Send + Unpin>;

/// Opens voice connections for a guild (the transport adapter)
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    /// Start joining `channel`
    ///
    /// The returned connection may not be ready yet; the session waits on
    /// [`VoiceConnection::wait_ready`] with its own timeout.
    async fn connect(&self, channel: &VoiceChannel) -> Result<Box<dyn VoiceConnection>>;
}

/// Transport between a session and its voice channel
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Resolve once the connection is ready to carry audio
    async fn wait_ready(&self) -> Result<()>;

    /// Route the sink's output into this connection
    fn bind(&self, sink: Arc<dyn AudioSink>);

    /// Leave the channel and release the connection
    fn teardown(&self);
}

/// Status notifications from an [`AudioSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// The current resource finished, or playback was stopped
    Idle,

    /// A resource started playing
    Playing,

    /// Playback failed
    Error(String),
}

/// Receiving end of a sink subscription
pub type SinkEvents = mpsc::UnboundedReceiver<SinkEvent>;

/// Real-time audio player
///
/// Commands are fire-and-forget; the outcome arrives as [`SinkEvent`]s.
/// Implementations must send [`SinkEvent::Idle`] when a playing resource ends
/// or is stopped, and must not send it when `play` replaces a resource.
pub trait AudioSink: Send + Sync {
    /// Start playing `resource`, replacing the current one
    fn play(&self, resource: AudioResource);

    fn pause(&self);

    fn unpause(&self);

    /// Stop the current resource (sends `Idle` if something was playing)
    fn stop(&self);

    /// New subscription to status notifications
    fn subscribe(&self) -> SinkEvents;
}

/// A playable resource handed to the sink
pub struct AudioResource {
    /// Audio bytes to decode
    pub stream: AudioStream,

    /// Volume control applied while this resource plays
    pub volume: Option<Arc<dyn VolumeControl>>,
}

impl fmt::Debug for AudioResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioResource")
            .field("volume", &self.volume.as_ref().map(|v| v.volume()))
            .finish_non_exhaustive()
    }
}

/// Turns a byte stream into a playable resource
pub trait ResourceBuilder: Send + Sync {
    fn build(&self, stream: AudioStream) -> Result<AudioResource>;
}

/// Default builder: attaches an [`InlineVolume`] to every resource
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineResourceBuilder;

impl ResourceBuilder for InlineResourceBuilder {
    fn build(&self, stream: AudioStream) -> Result<AudioResource> {
        Ok(AudioResource {
            stream,
            volume: Some(Arc::new(InlineVolume::default())),
        })
    }
}

/// Turns user input into URLs and metadata
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Free-text search; `None` when nothing playable was found
    async fn search(&self, query: &str) -> Option<String>;

    /// Best-effort metadata; falls back to [`TrackMetadata::placeholder`]
    async fn fetch_metadata(&self, url: &str) -> TrackMetadata;
}

/// Opens audio byte streams for canonical URLs
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// First stream any provider could open, `None` if all failed
    async fn open_stream(&self, url: &str) -> Option<AudioStream>;
}

/// Everything a session needs from the outside world
#[derive(Clone)]
pub struct Backends {
    pub connector: Arc<dyn VoiceConnector>,
    pub sink: Arc<dyn AudioSink>,
    pub resources: Arc<dyn ResourceBuilder>,
    pub resolver: Arc<dyn TrackResolver>,
    pub streams: Arc<dyn StreamSource>,
}

impl Backends {
    /// Backends using [`InlineResourceBuilder`]
    pub fn new(
        connector: Arc<dyn VoiceConnector>,
        sink: Arc<dyn AudioSink>,
        resolver: Arc<dyn TrackResolver>,
        streams: Arc<dyn StreamSource>,
    ) -> Self {
        Self {
            connector,
            sink,
            resources: Arc::new(InlineResourceBuilder),
            resolver,
            streams,
        }
    }

    /// Replace the resource builder
    pub fn with_resources(mut self, resources: Arc<dyn ResourceBuilder>) -> Self {
        self.resources = resources;
        self
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}
