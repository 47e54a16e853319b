//! yt-dlp adapter.
//!
//! Runs the `yt-dlp` binary for search (`ytsearchN:` / `scsearchN:`), metadata
//! (`--dump-json`) and audio streams (`-o -`, read from stdout).

use crate::error::{ResolverError, Result};
use crate::kind::UrlKind;
use crate::provider::{MetadataProvider, SearchHit, SearchProvider, StreamProvider};
use async_trait::async_trait;
use harmony_playback::{AudioStream, TrackMetadata, TrackSource};
use serde::Deserialize;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

/// Site searched by [`SearchProvider::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSite {
    #[default]
    Youtube,
    Soundcloud,
}

impl SearchSite {
    fn prefix(self) -> &'static str {
        match self {
            Self::Youtube => "ytsearch",
            Self::Soundcloud => "scsearch",
        }
    }
}

/// `yt-dlp` command runner.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    site: SearchSite,
    format: String,
}

impl YtDlp {
    /// Uses `yt-dlp` from `PATH`, searches YouTube, streams `bestaudio/best`.
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            site: SearchSite::default(),
            format: "bestaudio/best".to_string(),
        }
    }

    /// Run a different binary (e.g. an absolute path).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_search_site(mut self, site: SearchSite) -> Self {
        self.site = site;
        self
    }

    /// yt-dlp format selector for streams.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    /// Run to completion and return stdout.
    async fn output(&self, args: &[&str]) -> Result<Vec<u8>> {
        debug!(program = %self.program, ?args, "Running yt-dlp");

        let output = self
            .command()
            .args(args)
            .output()
            .await
            .map_err(|e| ResolverError::process(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolverError::process(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

// ===== Output parsing =====

/// Fields we read from `--dump-json` output.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    artist: Option<String>,
    /// Seconds, fractional for some extractors
    duration: Option<f64>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    extractor_key: Option<String>,
}

impl YtDlpInfo {
    fn source(&self, url: &str) -> TrackSource {
        match self.extractor_key.as_deref() {
            Some(key) if key.starts_with("Youtube") => TrackSource::Youtube,
            Some(key) if key.starts_with("Soundcloud") => TrackSource::Soundcloud,
            Some(key) if key.starts_with("Deezer") => TrackSource::Deezer,
            _ => UrlKind::classify(url).source(),
        }
    }
}

/// Parse a single `--dump-json` document into metadata for `url`.
pub(crate) fn parse_info(url: &str, json: &[u8]) -> Result<TrackMetadata> {
    let info: YtDlpInfo = serde_json::from_slice(json)
        .map_err(|e| ResolverError::parse(format!("yt-dlp metadata: {}", e)))?;

    Ok(TrackMetadata {
        source: info.source(url),
        title: info.title,
        author: info.artist.or(info.uploader).or(info.channel),
        duration: info
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64),
        thumbnail: info.thumbnail,
        url: url.to_string(),
    })
}

/// Parse newline-separated `--dump-json --flat-playlist` search output.
pub(crate) fn parse_search(stdout: &[u8]) -> Result<Vec<SearchHit>> {
    let text = std::str::from_utf8(stdout)
        .map_err(|e| ResolverError::parse(format!("yt-dlp output is not UTF-8: {}", e)))?;

    let mut hits = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let entry: YtDlpInfo = serde_json::from_str(line)
            .map_err(|e| ResolverError::parse(format!("yt-dlp search entry: {}", e)))?;

        let Some(url) = entry.webpage_url.clone().or_else(|| entry.url.clone()) else {
            continue;
        };
        hits.push(SearchHit {
            source: entry.source(&url),
            title: entry.title,
            url,
        });
    }
    Ok(hits)
}

// ===== Providers =====

#[async_trait]
impl SearchProvider for YtDlp {
    fn name(&self) -> &str {
        match self.site {
            SearchSite::Youtube => "yt-dlp/youtube",
            SearchSite::Soundcloud => "yt-dlp/soundcloud",
        }
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let target = format!("{}{}:{}", self.site.prefix(), limit.max(1), query);
        let stdout = self
            .output(&["--dump-json", "--flat-playlist", "--no-warnings", "-q", target.as_str()])
            .await?;

        let mut hits = parse_search(&stdout)?;
        hits.truncate(limit.max(1));
        Ok(hits)
    }
}

#[async_trait]
impl MetadataProvider for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    /// Spotify pages are DRM-only, everything else is worth a try.
    fn supports(&self, kind: UrlKind) -> bool {
        kind != UrlKind::Spotify
    }

    async fn metadata(&self, url: &str) -> Result<TrackMetadata> {
        let stdout = self
            .output(&["--dump-json", "--no-playlist", "--no-warnings", "-q", url])
            .await?;
        parse_info(url, &stdout)
    }
}

#[async_trait]
impl StreamProvider for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn supports(&self, kind: UrlKind) -> bool {
        kind != UrlKind::Spotify
    }

    /// Spawn yt-dlp writing audio to stdout.
    ///
    /// Waits for the first bytes so a URL yt-dlp cannot handle fails here
    /// rather than as an empty stream.
    async fn stream(&self, url: &str) -> Result<AudioStream> {
        let mut child = self
            .command()
            .args(["-f", self.format.as_str(), "-o", "-", "-q", "--no-warnings", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ResolverError::process(format!("failed to spawn {}: {}", self.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ResolverError::process("yt-dlp stdout not captured"))?;

        let mut reader = BufReader::new(ChildStream {
            _child: child,
            stdout,
        });
        if reader.fill_buf().await?.is_empty() {
            return Err(ResolverError::process(format!("yt-dlp produced no audio for {}", url)));
        }

        debug!(url, "yt-dlp stream started");
        Ok(Box::new(reader))
    }
}

/// Child stdout that keeps its process alive and kills it when dropped.
struct ChildStream {
    _child: Child,
    stdout: ChildStdout,
}

impl AsyncRead for ChildStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}
