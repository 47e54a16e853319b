//! Harmony - Voice Playback Sessions
//!
//! Per-channel music playback for a chat bot: one [`MusicPlayer`] per voice
//! channel, holding its own queue, history, loop flags, volume and idle timer.
//!
//! This crate provides:
//! - Play-or-enqueue from a URL or free-text query
//! - Pause, resume, skip, previous, stop and disconnect
//! - Queue shuffle with undo, loop-queue and loop-track
//! - Volume from 0% to 200%, applied live to the playing track
//! - Auto-leave when the queue runs dry or the channel stays idle
//! - A broadcast stream of [`PlayerEvent`]s for every state change
//!
//! # Architecture
//!
//! `harmony-playback` knows nothing about a particular voice library or music
//! platform. The host plugs those in through the traits in [`Backends`]:
//! - [`VoiceConnector`] / [`VoiceConnection`] join and leave the channel
//! - [`AudioSink`] plays resources and reports `Idle` / `Playing` / `Error`
//! - [`TrackResolver`] searches and fetches metadata
//! - [`StreamSource`] opens the audio bytes for a URL
//!
//! # Example: Session
//!
//! ```rust,ignore
//! use harmony_playback::{Backends, MusicPlayer, PlayerEvent, SessionConfig, VoiceChannel};
//!
//! let backends = Backends::new(connector, sink, resolver, streams);
//! let player = MusicPlayer::new(VoiceChannel::new(channel_id, guild_id), backends, SessionConfig::default());
//!
//! let mut events = player.subscribe();
//! player.play("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await;
//! player.play("daft punk one more time").await; // queued
//!
//! player.set_volume(150.0);
//! player.toggle_loop_queue();
//! player.skip();
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         PlayerEvent::Start { metadata, .. } => println!("Playing {}", metadata.url),
//!         PlayerEvent::Error { message } => eprintln!("{message}"),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Example: Configuration
//!
//! ```rust,no_run
//! use harmony_playback::SessionConfig;
//!
//! // harmony.toml, overridable with HARMONY_* environment variables
//! let config = SessionConfig::load(Some(std::path::Path::new("harmony.toml"))).unwrap();
//! assert!(config.auto_leave_on_idle().is_some() || config.auto_leave_on_idle_ms == 0);
//! ```

mod backend;
mod config;
mod error;
mod events;
mod history;
mod player;
mod queue;
mod shuffle;
pub mod types;
mod volume;

// Public exports
pub use backend::{
    AudioResource, AudioSink, AudioStream, Backends, InlineResourceBuilder, ResourceBuilder,
    SinkEvent, SinkEvents, StreamSource, TrackResolver, VoiceConnection, VoiceConnector,
};
pub use config::SessionConfig;
pub use error::{PlayerError, Result};
pub use events::PlayerEvent;
pub use history::History;
pub use player::{is_absolute_url, MusicPlayer};
pub use queue::Queue;
pub use shuffle::shuffle_random;
pub use types::{TrackMetadata, TrackSource, VoiceChannel};
pub use volume::{to_percent, InlineVolume, Volume, VolumeControl, MAX_MULTIPLIER};
