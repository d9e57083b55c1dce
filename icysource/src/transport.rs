//! Transport seam between the retry state machine and the network.
//!
//! The state machine only speaks `StreamTransport`/`StreamConnection`;
//! `HttpTransport` is the reqwest-backed production implementation.  Tests
//! drive the machine through scripted in-memory transports instead.

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::info::IcyHeaders;
use crate::source::{StreamKind, StreamSource};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Capability to open one streaming connection to a source.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, source: &StreamSource) -> Result<Box<dyn StreamConnection>>;
}

/// One open connection delivering the response body.
#[async_trait::async_trait]
pub trait StreamConnection: Send + std::fmt::Debug {
    /// Headers negotiated for this connection.  The metadata interval is
    /// fixed for the connection's lifetime.
    fn headers(&self) -> &IcyHeaders;

    /// Read the next chunk of body bytes.
    ///
    /// `Ok(None)` signals the server closed the stream; live radio never
    /// ends, so the caller treats that as a transient failure.
    async fn read_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// HTTP(S) transport built on a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, source: &StreamSource) -> Result<Box<dyn StreamConnection>> {
        let mut request = self.client.get(source.url().clone());
        // Segmented playlists carry no inline metadata; only ask for it on
        // plain audio mounts.
        if source.kind() == StreamKind::PlainAudio {
            request = request.header("Icy-MetaData", "1");
        }

        // The builder's connect timeout covers the socket; this one bounds
        // the wait for response headers as well.
        let response = tokio::time::timeout(self.config.connect_timeout(), request.send())
            .await
            .map_err(|_| Error::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        let headers = parse_icy_headers(response.headers());
        debug!(
            url = %source.url(),
            metaint = headers.metadata_interval,
            station = headers.station_name.as_deref().unwrap_or("<unknown>"),
            "Stream connection established"
        );

        Ok(Box::new(HttpConnection {
            headers,
            body: Box::pin(response.bytes_stream()),
            read_timeout: self.config.read_timeout(),
        }))
    }
}

struct HttpConnection {
    headers: IcyHeaders,
    body: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    read_timeout: Duration,
}

impl std::fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection")
            .field("headers", &self.headers)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl StreamConnection for HttpConnection {
    fn headers(&self) -> &IcyHeaders {
        &self.headers
    }

    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        match tokio::time::timeout(self.read_timeout, self.body.next()).await {
            Ok(Some(Ok(chunk))) => Ok(Some(chunk)),
            Ok(Some(Err(err))) => Err(Error::Http(err)),
            Ok(None) => Ok(None),
            Err(_) => Err(Error::Timeout),
        }
    }
}

/// Parse the `icy-*` description headers of one response.
pub fn parse_icy_headers(headers: &reqwest::header::HeaderMap) -> IcyHeaders {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    IcyHeaders {
        metadata_interval: headers
            .get("icy-metaint")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0),
        station_name: text("icy-name"),
        genre: text("icy-genre"),
        station_url: text("icy-url"),
        bitrate_kbps: headers
            .get("icy-br")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok()),
        content_type: text("content-type"),
    }
}
