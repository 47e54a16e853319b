//! URL classification.
//!
//! Decides which platform a URL belongs to so the chain only asks providers
//! that can handle it. Checks run in a fixed order: SoundCloud, Spotify,
//! YouTube, Deezer.

use harmony_playback::TrackSource;
use serde::{Deserialize, Serialize};

pub use harmony_playback::is_absolute_url;

/// Platform a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    Soundcloud,
    Spotify,
    Youtube,
    Deezer,
    Other,
}

impl UrlKind {
    /// Classify `input`.
    ///
    /// YouTube links may omit the scheme (`youtu.be/abc`); the other platforms
    /// need `http://` or `https://`. Spotify only counts for track, album and
    /// playlist pages.
    pub fn classify(input: &str) -> Self {
        let input = input.trim();

        if let Some(rest) = strip_scheme(input) {
            if starts_with_host(rest, &["soundcloud.com", "snd.sc"]) {
                return Self::Soundcloud;
            }
            if let Some(path) = rest.strip_prefix("open.spotify.com/") {
                if ["track/", "album/", "playlist/"]
                    .iter()
                    .any(|kind| path.starts_with(kind))
                {
                    return Self::Spotify;
                }
            }
        }

        let bare = strip_scheme(input).unwrap_or(input);
        let bare = bare.strip_prefix("www.").unwrap_or(bare);
        if starts_with_host(bare, &["youtube.com", "youtu.be"]) {
            return Self::Youtube;
        }

        if let Some(rest) = strip_scheme(input) {
            let rest = rest.strip_prefix("www.").unwrap_or(rest);
            if starts_with_host(rest, &["deezer.com", "deezer.page.link"]) {
                return Self::Deezer;
            }
        }

        Self::Other
    }

    /// Track source recorded for metadata from this kind of URL.
    pub fn source(self) -> TrackSource {
        match self {
            Self::Soundcloud => TrackSource::Soundcloud,
            Self::Spotify => TrackSource::Spotify,
            Self::Youtube => TrackSource::Youtube,
            Self::Deezer => TrackSource::Deezer,
            Self::Other => TrackSource::Unknown,
        }
    }
}

impl std::fmt::Display for UrlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Soundcloud => "soundcloud",
            Self::Spotify => "spotify",
            Self::Youtube => "youtube",
            Self::Deezer => "deezer",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

fn strip_scheme(input: &str) -> Option<&str> {
    input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
}

/// `rest` begins with one of `hosts` followed by a path separator.
fn starts_with_host(rest: &str, hosts: &[&str]) -> bool {
    hosts.iter().any(|host| {
        rest.strip_prefix(host)
            .is_some_and(|after| after.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_urls() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
            "www.youtube.com/playlist?list=PL123",
        ] {
            assert_eq!(UrlKind::classify(url), UrlKind::Youtube, "{}", url);
        }
    }

    #[test]
    fn soundcloud_needs_scheme() {
        assert_eq!(
            UrlKind::classify("https://soundcloud.com/artist/track"),
            UrlKind::Soundcloud
        );
        assert_eq!(UrlKind::classify("http://snd.sc/abc"), UrlKind::Soundcloud);
        assert_eq!(UrlKind::classify("soundcloud.com/artist/track"), UrlKind::Other);
    }

    #[test]
    fn spotify_only_for_playable_pages() {
        assert_eq!(
            UrlKind::classify("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
            UrlKind::Spotify
        );
        assert_eq!(
            UrlKind::classify("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            UrlKind::Spotify
        );
        assert_eq!(
            UrlKind::classify("https://open.spotify.com/artist/0OdUWJ0sBjDrqHygGUXeCF"),
            UrlKind::Other
        );
    }

    #[test]
    fn lookalike_hosts_are_other() {
        assert_eq!(UrlKind::classify("https://notyoutube.com/watch"), UrlKind::Other);
        assert_eq!(UrlKind::classify("https://youtube.com.evil.io/x"), UrlKind::Other);
        assert_eq!(UrlKind::classify("lofi hip hop"), UrlKind::Other);
    }

    #[test]
    fn deezer_urls() {
        assert_eq!(
            UrlKind::classify("https://www.deezer.com/track/3135556"),
            UrlKind::Deezer
        );
        assert_eq!(UrlKind::Deezer.source(), TrackSource::Deezer);
    }

    #[test]
    fn absolute_url_detection() {
        assert!(is_absolute_url("https://example.com/song.mp3"));
        assert!(is_absolute_url("  http://snd.sc/abc "));
        assert!(!is_absolute_url("youtu.be/abc"));
        assert!(!is_absolute_url("ftp://example.com/song.mp3"));
        assert!(!is_absolute_url("never gonna give you up"));
    }
}
