//! Harmony - Track Resolution
//!
//! Concrete [`TrackResolver`](harmony_playback::TrackResolver) and
//! [`StreamSource`](harmony_playback::StreamSource) implementations for
//! `harmony-playback` sessions.
//!
//! This crate provides:
//! - URL classification (YouTube, SoundCloud, Spotify, Deezer)
//! - Provider traits for search, metadata and streams
//! - An ordered provider chain with placeholder fallback
//! - A `yt-dlp` adapter (search, metadata, audio stream)
//! - An oEmbed metadata client
//! - Spotify playback through a YouTube match
//!
//! # Example
//!
//! ```rust,ignore
//! use harmony_playback::{Backends, MusicPlayer, SessionConfig};
//! use harmony_resolver::ChainResolver;
//! use std::sync::Arc;
//!
//! let chain = Arc::new(ChainResolver::standard()?);
//! let backends = Backends::new(connector, sink, chain.clone(), chain);
//! let player = MusicPlayer::new(channel, backends, SessionConfig::default());
//! ```

mod chain;
mod error;
mod kind;
mod oembed;
mod provider;
mod spotify;
mod ytdlp;

// Public exports
pub use chain::{ChainResolver, DEFAULT_PROVIDER_TIMEOUT};
pub use error::{ResolverError, Result};
pub use kind::{is_absolute_url, UrlKind};
pub use oembed::{OEmbedClient, OEmbedEndpoints};
pub use provider::{MetadataProvider, SearchHit, SearchProvider, StreamProvider};
pub use spotify::SpotifyBridge;
pub use ytdlp::{SearchSite, YtDlp};
