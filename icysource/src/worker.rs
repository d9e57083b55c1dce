//! Connection/retry state machine.
//!
//! One worker task per playback session owns the transport lifecycle:
//! connect, read loop, failure classification, bounded retry with an
//! interruptible delay, and escalation to the terminal failure state.  The
//! demultiplexer and the byte counters are driven synchronously from inside
//! the loop, so event ordering needs no further coordination.

use crate::config::RetryPolicy;
use crate::counters::ByteCounters;
use crate::demux::{DemuxItem, IcyDemuxer};
use crate::events::{EventSink, SourceEvent};
use crate::info::{ShoutcastInfo, StreamLiveInfo};
use crate::source::StreamSource;
use crate::transport::{StreamConnection, StreamTransport};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session started yet.
    Idle,
    /// First connection attempt in flight.
    Connecting,
    /// Connected; audio and metadata are flowing.
    Streaming,
    /// Transient failure; waiting out the retry delay or reattempting.
    Reconnecting,
    /// Retry budget exhausted; inert until restarted.
    Failed,
    /// Explicitly stopped.
    Stopped,
}

impl ConnectionState {
    /// Whether the session is still making progress or trying to.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Streaming | Self::Reconnecting
        )
    }
}

/// Everything one worker task needs, handed over at spawn time.
pub(crate) struct WorkerContext {
    pub source: StreamSource,
    pub policy: RetryPolicy,
    pub transport: Arc<dyn StreamTransport>,
    pub sink: Arc<dyn EventSink>,
    pub counters: Arc<ByteCounters>,
    pub state: watch::Sender<ConnectionState>,
    pub cancel: CancellationToken,
}

enum SessionExit {
    /// Cancellation observed; leave without emitting anything further.
    Stopped,
    /// Transient transport failure; the retry path decides what follows.
    Lost,
}

/// Run one playback session to completion.
///
/// Attempts are strictly sequential: a new connection is only opened after
/// the previous one is gone and the retry delay has fully elapsed, so at
/// most one transport connection exists at any time.
pub(crate) async fn run(ctx: WorkerContext) {
    info!(url = %ctx.source, "Starting radio stream session");
    let mut failures: u32 = 0;

    loop {
        if ctx.cancel.is_cancelled() {
            ctx.state.send_replace(ConnectionState::Stopped);
            return;
        }

        let connect = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                ctx.state.send_replace(ConnectionState::Stopped);
                return;
            }
            result = ctx.transport.open(&ctx.source) => result,
        };

        match connect {
            Ok(conn) => {
                // Successful transition into Streaming resets the budget.
                failures = 0;
                ctx.state.send_replace(ConnectionState::Streaming);

                let headers = conn.headers().clone();
                ctx.sink
                    .on_event(SourceEvent::Connected {
                        headers: headers.clone(),
                    })
                    .await;
                ctx.sink
                    .on_event(SourceEvent::ShoutcastInfo(ShoutcastInfo::from_headers(
                        &headers,
                    )))
                    .await;

                match stream_session(conn, &ctx).await {
                    SessionExit::Stopped => {
                        ctx.state.send_replace(ConnectionState::Stopped);
                        return;
                    }
                    SessionExit::Lost => {}
                }
            }
            Err(err) => {
                warn!(url = %ctx.source, "Connection attempt failed: {err}");
            }
        }

        // Transient failure path, for both a failed connect and a broken
        // read loop.
        if ctx.cancel.is_cancelled() {
            ctx.state.send_replace(ConnectionState::Stopped);
            return;
        }
        ctx.sink.on_event(SourceEvent::ConnectionLost).await;

        failures += 1;
        if failures > ctx.policy.max_retries {
            warn!(
                url = %ctx.source,
                failures, "Retries exhausted, giving up on stream"
            );
            ctx.state.send_replace(ConnectionState::Failed);
            ctx.sink
                .on_event(SourceEvent::ConnectionLostIrrecoverably)
                .await;
            return;
        }

        debug!(
            url = %ctx.source,
            failures,
            delay_secs = ctx.policy.retry_delay_secs,
            "Waiting before reconnect"
        );
        ctx.state.send_replace(ConnectionState::Reconnecting);
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                ctx.state.send_replace(ConnectionState::Stopped);
                return;
            }
            _ = tokio::time::sleep(ctx.policy.retry_delay()) => {}
        }
    }
}

/// Read loop of one established connection.
async fn stream_session(mut conn: Box<dyn StreamConnection>, ctx: &WorkerContext) -> SessionExit {
    let station_name = conn.headers().station_name.clone();
    // The interval holds for this connection only; a reconnect negotiates
    // a fresh one.
    let mut demux = IcyDemuxer::new(conn.headers().metadata_interval);
    let mut items = Vec::new();

    loop {
        let chunk = tokio::select! {
            _ = ctx.cancel.cancelled() => return SessionExit::Stopped,
            result = conn.read_chunk() => result,
        };

        match chunk {
            Ok(Some(data)) => {
                demux.push(data, &mut items);
                for item in items.drain(..) {
                    match item {
                        DemuxItem::Audio(run) => {
                            ctx.counters.record(run.len() as u64);
                            ctx.sink
                                .on_event(SourceEvent::BytesRead { data: run })
                                .await;
                        }
                        DemuxItem::Metadata(info) => {
                            let live = StreamLiveInfo::derive(&info, station_name.as_deref());
                            debug!(title = %live.title, "Now playing update");
                            ctx.sink
                                .on_event(SourceEvent::ShoutcastInfo(Some(info)))
                                .await;
                            ctx.sink.on_event(SourceEvent::StreamLiveInfo(live)).await;
                        }
                    }
                }
            }
            Ok(None) => {
                info!(url = %ctx.source, "Server closed the stream");
                return SessionExit::Lost;
            }
            Err(err) => {
                warn!(url = %ctx.source, "Read failed: {err}");
                return SessionExit::Lost;
            }
        }
    }
}
