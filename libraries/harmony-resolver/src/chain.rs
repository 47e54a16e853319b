//! Ordered provider chains.

use crate::error::{ResolverError, Result};
use crate::kind::UrlKind;
use crate::oembed::OEmbedClient;
use crate::provider::{MetadataProvider, SearchProvider, StreamProvider};
use crate::spotify::SpotifyBridge;
use crate::ytdlp::{SearchSite, YtDlp};
use async_trait::async_trait;
use harmony_playback::{AudioStream, StreamSource, TrackMetadata, TrackResolver, TrackSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default time a single provider gets before the chain moves on.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Tries providers in registration order, first success wins.
///
/// Implements both [`TrackResolver`] and [`StreamSource`], so one
/// `Arc<ChainResolver>` can fill both slots of a session's backends.
///
/// # Example
///
/// ```ignore
/// use harmony_resolver::{ChainResolver, OEmbedClient, SearchSite, YtDlp};
/// use std::sync::Arc;
///
/// let chain = ChainResolver::new()
///     .with_search(Arc::new(YtDlp::new().with_search_site(SearchSite::Soundcloud)))
///     .with_search(Arc::new(YtDlp::new()))
///     .with_metadata(Arc::new(OEmbedClient::new()?))
///     .with_metadata(Arc::new(YtDlp::new()))
///     .with_stream(Arc::new(YtDlp::new()));
/// ```
#[derive(Clone)]
pub struct ChainResolver {
    search: Vec<Arc<dyn SearchProvider>>,
    metadata: Vec<Arc<dyn MetadataProvider>>,
    streams: Vec<Arc<dyn StreamProvider>>,
    timeout: Duration,
}

impl ChainResolver {
    /// Empty chain: finds nothing, streams nothing, returns placeholders.
    pub fn new() -> Self {
        Self {
            search: Vec::new(),
            metadata: Vec::new(),
            streams: Vec::new(),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// The usual setup, backed by `yt-dlp` on `PATH`.
    ///
    /// Search tries SoundCloud before YouTube. Metadata tries oEmbed before
    /// yt-dlp. Streams come from yt-dlp, except Spotify tracks, which stream
    /// their YouTube match.
    pub fn standard() -> Result<Self> {
        Self::standard_with(YtDlp::new())
    }

    /// [`ChainResolver::standard`] with a configured yt-dlp runner.
    pub fn standard_with(ytdlp: YtDlp) -> Result<Self> {
        let oembed = Arc::new(OEmbedClient::new()?);
        let youtube = Arc::new(ytdlp.clone().with_search_site(SearchSite::Youtube));
        let spotify = SpotifyBridge::new(oembed.clone(), youtube.clone(), youtube);

        Ok(Self::new()
            .with_search(Arc::new(ytdlp.clone().with_search_site(SearchSite::Soundcloud)))
            .with_search(Arc::new(ytdlp.clone()))
            .with_metadata(oembed)
            .with_metadata(Arc::new(ytdlp.clone()))
            .with_stream(Arc::new(spotify))
            .with_stream(Arc::new(ytdlp)))
    }

    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search.push(provider);
        self
    }

    pub fn with_metadata(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata.push(provider);
        self
    }

    pub fn with_stream(mut self, provider: Arc<dyn StreamProvider>) -> Self {
        self.streams.push(provider);
        self
    }

    /// Per-provider time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(ResolverError::process(format!(
                    "provider timed out after {:?}",
                    self.timeout
                )))
            })
    }
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |list: Vec<&str>| list.join(", ");
        f.debug_struct("ChainResolver")
            .field("search", &names(self.search.iter().map(|p| p.name()).collect()))
            .field("metadata", &names(self.metadata.iter().map(|p| p.name()).collect()))
            .field("streams", &names(self.streams.iter().map(|p| p.name()).collect()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl TrackResolver for ChainResolver {
    async fn search(&self, query: &str) -> Option<String> {
        for provider in &self.search {
            match self.bounded(provider.search(query, 1)).await {
                Ok(hits) => {
                    if let Some(hit) = hits.into_iter().next() {
                        debug!(provider = provider.name(), query, url = %hit.url, "Search hit");
                        return Some(hit.url);
                    }
                    debug!(provider = provider.name(), query, "No search results");
                }
                Err(e) => {
                    warn!(provider = provider.name(), query, error = %e, "Search failed");
                }
            }
        }
        None
    }

    async fn fetch_metadata(&self, url: &str) -> TrackMetadata {
        let kind = UrlKind::classify(url);

        for provider in self.metadata.iter().filter(|p| p.supports(kind)) {
            match self.bounded(provider.metadata(url)).await {
                Ok(mut metadata) => {
                    if metadata.source == TrackSource::Unknown {
                        metadata.source = kind.source();
                    }
                    // Sessions key history by the URL they asked for
                    metadata.url = url.to_string();
                    return metadata;
                }
                Err(e) => {
                    debug!(provider = provider.name(), url, error = %e, "Metadata lookup failed");
                }
            }
        }

        warn!(url, %kind, "No metadata available, using placeholder");
        TrackMetadata {
            source: kind.source(),
            ..TrackMetadata::placeholder(url)
        }
    }
}

#[async_trait]
impl StreamSource for ChainResolver {
    async fn open_stream(&self, url: &str) -> Option<AudioStream> {
        let kind = UrlKind::classify(url);

        for provider in self.streams.iter().filter(|p| p.supports(kind)) {
            match self.bounded(provider.stream(url)).await {
                Ok(stream) => {
                    debug!(provider = provider.name(), url, %kind, "Stream opened");
                    return Some(stream);
                }
                Err(e) => {
                    warn!(provider = provider.name(), url, error = %e, "Stream provider failed");
                }
            }
        }
        None
    }
}
