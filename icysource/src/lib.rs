//! # icysource - Resilient internet-radio data source
//!
//! `icysource` is the network half of a radio player: it opens an HTTP(S)
//! connection to an Icecast/Shoutcast-style stream, rides out transient
//! network failures by reconnecting with a bounded retry budget, separates
//! the inline ICY metadata blocks from the audio bytes, and reports
//! connection, metadata and byte-transfer events to the consuming media
//! pipeline.  Decoding, rendering and every other player concern live in
//! the consumer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use icysource::{ChannelSink, RadioDataSource, RetryPolicy, SourceEvent, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (sink, mut events) = ChannelSink::new(64);
//!     let source = RadioDataSource::with_http(TransportConfig::default(), Arc::new(sink))?;
//!
//!     source
//!         .start_url("http://radio.example.com:8000/stream", RetryPolicy::default())
//!         .await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             SourceEvent::StreamLiveInfo(live) => println!("Now playing: {}", live.title),
//!             SourceEvent::BytesRead { .. } => { /* feed the decoder */ }
//!             SourceEvent::ConnectionLostIrrecoverably => break,
//!             _ => {}
//!         }
//!     }
//!
//!     source.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Events for one connection attempt arrive in detection order.
//! - Audio bytes are never corrupted by metadata framing; metadata blocks
//!   are never counted as transferred audio.
//! - Retries are strictly sequential with an interruptible delay; exactly
//!   one [`SourceEvent::ConnectionLostIrrecoverably`] fires once the budget
//!   is exhausted, after which the source is quiescent.
//! - `stop()` is bounded by one read timeout or the remaining retry delay.

pub mod config;
pub mod counters;
mod data_source;
pub mod demux;
pub mod error;
pub mod events;
pub mod info;
pub mod source;
pub mod transport;
mod worker;

pub use config::{RetryPolicy, TransportConfig};
pub use counters::{ByteCounters, CounterSnapshot};
pub use data_source::RadioDataSource;
pub use demux::{DemuxItem, IcyDemuxer};
pub use error::{Error, Result};
pub use events::{ChannelSink, EventSink, SourceEvent};
pub use info::{IcyHeaders, ShoutcastInfo, StreamLiveInfo};
pub use source::{StreamKind, StreamSource};
pub use transport::{HttpTransport, StreamConnection, StreamTransport};
pub use worker::ConnectionState;
