//! oEmbed metadata client.
//!
//! YouTube, SoundCloud and Spotify all publish an oEmbed endpoint that returns
//! title, author and thumbnail for a public URL without authentication.
//! Durations are not part of oEmbed.

use crate::error::{ResolverError, Result};
use crate::kind::UrlKind;
use crate::provider::MetadataProvider;
use async_trait::async_trait;
use harmony_playback::TrackMetadata;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const YOUTUBE_ENDPOINT: &str = "https://www.youtube.com/oembed";
const SOUNDCLOUD_ENDPOINT: &str = "https://soundcloud.com/oembed";
const SPOTIFY_ENDPOINT: &str = "https://open.spotify.com/oembed";

/// oEmbed endpoint per platform.
#[derive(Debug, Clone)]
pub struct OEmbedEndpoints {
    pub youtube: Url,
    pub soundcloud: Url,
    pub spotify: Url,
}

impl OEmbedEndpoints {
    /// The platforms' public endpoints.
    pub fn public() -> Result<Self> {
        Ok(Self {
            youtube: parse_url(YOUTUBE_ENDPOINT)?,
            soundcloud: parse_url(SOUNDCLOUD_ENDPOINT)?,
            spotify: parse_url(SPOTIFY_ENDPOINT)?,
        })
    }

    /// All platforms served from one base URL (`{base}/youtube`, ...).
    ///
    /// Used to point the client at a local mock server.
    pub fn with_base(base: &str) -> Result<Self> {
        let base = base.trim_end_matches('/');
        Ok(Self {
            youtube: parse_url(&format!("{}/youtube", base))?,
            soundcloud: parse_url(&format!("{}/soundcloud", base))?,
            spotify: parse_url(&format!("{}/spotify", base))?,
        })
    }

    fn for_kind(&self, kind: UrlKind) -> Option<&Url> {
        match kind {
            UrlKind::Youtube => Some(&self.youtube),
            UrlKind::Soundcloud => Some(&self.soundcloud),
            UrlKind::Spotify => Some(&self.spotify),
            UrlKind::Deezer | UrlKind::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// Metadata from oEmbed endpoints.
#[derive(Debug, Clone)]
pub struct OEmbedClient {
    http: Client,
    endpoints: OEmbedEndpoints,
}

impl OEmbedClient {
    /// Client for the public endpoints.
    pub fn new() -> Result<Self> {
        Self::with_endpoints(OEmbedEndpoints::public()?)
    }

    pub fn with_endpoints(endpoints: OEmbedEndpoints) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(format!("Harmony/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, endpoints })
    }
}

#[async_trait]
impl MetadataProvider for OEmbedClient {
    fn name(&self) -> &str {
        "oembed"
    }

    fn supports(&self, kind: UrlKind) -> bool {
        self.endpoints.for_kind(kind).is_some()
    }

    async fn metadata(&self, url: &str) -> Result<TrackMetadata> {
        let kind = UrlKind::classify(url);
        let endpoint = self
            .endpoints
            .for_kind(kind)
            .ok_or_else(|| ResolverError::unsupported(url))?;

        debug!(url, endpoint = %endpoint, "Fetching oEmbed metadata");

        let response = self
            .http
            .get(endpoint.clone())
            .query(&[("url", url), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| ResolverError::parse(format!("oEmbed response: {}", e)))?;

        Ok(TrackMetadata {
            title: body.title,
            author: body.author_name,
            duration: None,
            thumbnail: body.thumbnail_url,
            source: kind.source(),
            url: url.to_string(),
        })
    }
}

fn parse_url(input: &str) -> Result<Url> {
    Url::parse(input).map_err(|e| ResolverError::InvalidUrl(format!("{}: {}", input, e)))
}
