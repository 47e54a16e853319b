//! Spotify playback through a matching track elsewhere.
//!
//! Spotify does not serve audio to third parties, so a Spotify track URL is
//! played by looking up its title, searching for it on another platform and
//! streaming the first hit.

use crate::error::{ResolverError, Result};
use crate::kind::UrlKind;
use crate::provider::{MetadataProvider, SearchProvider, StreamProvider};
use async_trait::async_trait;
use harmony_playback::AudioStream;
use std::sync::Arc;
use tracing::debug;

/// Streams Spotify URLs via a search on another platform.
///
/// # Example
///
/// ```ignore
/// use harmony_resolver::{OEmbedClient, SpotifyBridge, YtDlp};
/// use std::sync::Arc;
///
/// let ytdlp = Arc::new(YtDlp::new());
/// let bridge = SpotifyBridge::new(Arc::new(OEmbedClient::new()?), ytdlp.clone(), ytdlp);
/// ```
#[derive(Clone)]
pub struct SpotifyBridge {
    metadata: Arc<dyn MetadataProvider>,
    search: Arc<dyn SearchProvider>,
    stream: Arc<dyn StreamProvider>,
}

impl SpotifyBridge {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        search: Arc<dyn SearchProvider>,
        stream: Arc<dyn StreamProvider>,
    ) -> Self {
        Self {
            metadata,
            search,
            stream,
        }
    }
}

impl std::fmt::Debug for SpotifyBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyBridge")
            .field("metadata", &self.metadata.name())
            .field("search", &self.search.name())
            .field("stream", &self.stream.name())
            .finish()
    }
}

#[async_trait]
impl StreamProvider for SpotifyBridge {
    fn name(&self) -> &str {
        "spotify-bridge"
    }

    fn supports(&self, kind: UrlKind) -> bool {
        kind == UrlKind::Spotify
    }

    async fn stream(&self, url: &str) -> Result<AudioStream> {
        let metadata = self.metadata.metadata(url).await?;
        let query = match (metadata.author.as_deref(), metadata.title.as_deref()) {
            (Some(author), Some(title)) => format!("{} {}", author, title),
            (None, Some(title)) => title.to_string(),
            _ => return Err(ResolverError::parse(format!("no title for {}", url))),
        };

        let hit = self
            .search
            .search(&query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ResolverError::process(format!("no match for \"{}\"", query)))?;

        if !self.stream.supports(UrlKind::classify(&hit.url)) {
            return Err(ResolverError::unsupported(hit.url));
        }

        debug!(url, query = %query, matched = %hit.url, "Streaming Spotify track from match");
        self.stream.stream(&hit.url).await
    }
}
