//! Stream description and now-playing metadata.
//!
//! Two sources feed these types: the `icy-*` response headers parsed once
//! per connection, and the inline metadata blocks the demultiplexer extracts
//! from the byte stream while playing.

/// Headers describing one ICY connection, parsed from the HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcyHeaders {
    /// Number of audio bytes between inline metadata blocks.
    /// 0 means the server interleaves no metadata at all.
    pub metadata_interval: usize,
    pub station_name: Option<String>,
    pub genre: Option<String>,
    pub station_url: Option<String>,
    pub bitrate_kbps: Option<u32>,
    pub content_type: Option<String>,
}

/// Flat key/value view of Shoutcast stream information.
///
/// Built either from one parsed inline metadata block (`stream_title`,
/// `stream_url`) or from the connect-time response headers (station fields).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoutcastInfo {
    pub stream_title: Option<String>,
    pub stream_url: Option<String>,
    pub station_name: Option<String>,
    pub genre: Option<String>,
    pub bitrate_kbps: Option<u32>,
}

impl ShoutcastInfo {
    /// Parse one inline metadata block payload.
    ///
    /// The payload is a `key='value';` sequence, usually padded with
    /// trailing NUL bytes up to a multiple of 16.  A malformed payload
    /// yields `None`; it never aborts the stream.
    pub fn from_metadata_block(payload: &[u8]) -> Option<Self> {
        let fields = parse_metadata_fields(payload);
        if fields.is_empty() {
            return None;
        }

        let mut info = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "StreamTitle" => info.stream_title = Some(value),
                "StreamUrl" => info.stream_url = non_empty(value),
                _ => {}
            }
        }

        // A block that names none of the known keys carries no info.
        if info.stream_title.is_none() && info.stream_url.is_none() {
            return None;
        }
        Some(info)
    }

    /// Derive station information from the connect-time headers.
    ///
    /// Returns `None` when the server sent no `icy-*` headers at all, i.e.
    /// it is not a Shoutcast-style endpoint.
    pub fn from_headers(headers: &IcyHeaders) -> Option<Self> {
        if headers.station_name.is_none()
            && headers.genre.is_none()
            && headers.station_url.is_none()
            && headers.bitrate_kbps.is_none()
            && headers.metadata_interval == 0
        {
            return None;
        }
        Some(Self {
            stream_title: None,
            stream_url: headers.station_url.clone(),
            station_name: headers.station_name.clone(),
            genre: headers.genre.clone(),
            bitrate_kbps: headers.bitrate_kbps,
        })
    }
}

/// Immutable now-playing snapshot, one per successfully parsed metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamLiveInfo {
    /// Raw `StreamTitle` value as sent by the server.
    pub title: String,
    /// Artist half of an `Artist - Track` title, when the split applies.
    pub artist: Option<String>,
    /// Track half of the title, or the whole title when there is no artist.
    pub track: Option<String>,
    /// Station name from the connection headers, when known.
    pub station_name: Option<String>,
}

impl StreamLiveInfo {
    /// Derive a snapshot from one `ShoutcastInfo` plus the source context.
    pub fn derive(info: &ShoutcastInfo, station_name: Option<&str>) -> Self {
        let title = info.stream_title.clone().unwrap_or_default();
        let (artist, track) = match title.split_once(" - ") {
            Some((artist, track)) if !artist.is_empty() && !track.is_empty() => {
                (Some(artist.to_string()), Some(track.to_string()))
            }
            _ if !title.is_empty() => (None, Some(title.clone())),
            _ => (None, None),
        };
        Self {
            title,
            artist,
            track,
            station_name: station_name.map(str::to_string),
        }
    }
}

/// Split a metadata block payload into `key='value'` pairs.
///
/// Tolerant by design: trailing padding is dropped, assignments that do not
/// follow the quoted form are skipped, and values may be empty.
pub(crate) fn parse_metadata_fields(payload: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(payload);
    let text = text.trim_end_matches(['\0', ' ']);

    let mut fields = Vec::new();
    for assignment in text.split(';') {
        let assignment = assignment.trim();
        if assignment.is_empty() {
            continue;
        }
        let Some((key, rest)) = assignment.split_once("='") else {
            continue;
        };
        let Some(value) = rest.strip_suffix('\'') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        fields.push((key.to_string(), value.to_string()));
    }
    fields
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
