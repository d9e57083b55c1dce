//! Event surface exposed to the consuming media pipeline.
//!
//! The worker task invokes the sink synchronously from its read loop, so
//! events for one connection attempt arrive in detection order: `Connected`
//! first, then any number of interleaved metadata and byte events, then at
//! most one of the two connection-lost variants.  `ConnectionLostIrrecoverably`
//! is only ever delivered after retry activity has stopped; the consumer may
//! assume the source is quiescent when it arrives.

use crate::info::{IcyHeaders, ShoutcastInfo, StreamLiveInfo};
use bytes::Bytes;
use tokio::sync::mpsc;

/// Everything the data source reports to its consumer.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// Transport established and response headers validated.
    Connected { headers: IcyHeaders },
    /// Transient failure; a reconnect attempt is in progress.
    ConnectionLost,
    /// Retry budget exhausted; the source is inert until restarted.
    ConnectionLostIrrecoverably,
    /// Raw Shoutcast information: header-derived right after `Connected`
    /// (absent for non-Shoutcast servers), block-derived while streaming.
    ShoutcastInfo(Option<ShoutcastInfo>),
    /// Derived now-playing snapshot, one per parsed metadata block.
    StreamLiveInfo(StreamLiveInfo),
    /// One run of raw audio bytes, already counted, for the decoder and
    /// optional recording by the consumer.
    BytesRead { data: Bytes },
}

/// Capability the core invokes on its consumer.
///
/// Calls arrive from the worker task; the consumer applies its own
/// thread-safety discipline.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, event: SourceEvent);
}

/// Sink pushing events into a bounded channel drained by the consumer.
///
/// Delivery order is the channel order; a full channel makes the worker
/// wait, which in turn applies back pressure on the network reads.  Events
/// sent after the receiver is dropped are discarded.
pub struct ChannelSink {
    tx: mpsc::Sender<SourceEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver end the consumer drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SourceEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl EventSink for ChannelSink {
    async fn on_event(&self, event: SourceEvent) {
        let _ = self.tx.send(event).await;
    }
}
