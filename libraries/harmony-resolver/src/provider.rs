//! Provider traits.
//!
//! A provider is one way of answering one question (search, metadata or
//! stream). The [`ChainResolver`](crate::ChainResolver) asks providers in
//! order until one succeeds.

use crate::error::Result;
use crate::kind::UrlKind;
use async_trait::async_trait;
use harmony_playback::{AudioStream, TrackMetadata, TrackSource};
use serde::{Deserialize, Serialize};

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Canonical playable URL
    pub url: String,
    pub title: Option<String>,
    pub source: TrackSource,
}

/// Free-text search.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Up to `limit` hits, best first. An empty list means no match.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// Metadata lookup for a URL.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this provider understands URLs of `kind`.
    fn supports(&self, kind: UrlKind) -> bool;

    async fn metadata(&self, url: &str) -> Result<TrackMetadata>;
}

/// Audio byte streams for a URL.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, kind: UrlKind) -> bool;

    async fn stream(&self, url: &str) -> Result<AudioStream>;
}
