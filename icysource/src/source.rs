//! Stream source description.

use crate::error::{Error, Result};
use url::Url;

/// How the bytes behind a URL are organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// A continuous audio byte stream (the usual Icecast/Shoutcast mount).
    PlainAudio,
    /// A segmented playlist (HLS); such streams carry no inline metadata.
    SegmentedStream,
}

/// One radio stream to play.
///
/// Created when a playback request begins and replaced, never mutated, when
/// the URL changes.  Identity is compared by URL: the current-playback byte
/// counter resets exactly when two consecutive sessions disagree on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    url: Url,
    kind: StreamKind,
}

impl StreamSource {
    /// Parse a raw URL string into a stream source.
    ///
    /// Rejects anything that is not an absolute http(s) URL; this is the
    /// synchronous validation gate of a start request.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;
        Self::new(url)
    }

    /// Build a stream source from an already parsed URL.
    pub fn new(url: Url) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(Error::UnsupportedScheme(other.to_string())),
        }
        let kind = if url.path().ends_with(".m3u8") {
            StreamKind::SegmentedStream
        } else {
            StreamKind::PlainAudio
        };
        Ok(Self { url, kind })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Whether two sources point at the same stream.
    pub fn same_stream(&self, other: &StreamSource) -> bool {
        self.url == other.url
    }
}

impl std::fmt::Display for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}
