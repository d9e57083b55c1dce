//! Public handle of the radio data source.
//!
//! `RadioDataSource` owns the byte counters and the per-session worker
//! task.  Sessions are strictly sequential: a new `start()` cancels and
//! joins the previous worker before spawning the next one, so at most one
//! transport connection is alive at any time.

use crate::config::{RetryPolicy, TransportConfig};
use crate::counters::{ByteCounters, CounterSnapshot};
use crate::error::Result;
use crate::events::EventSink;
use crate::source::StreamSource;
use crate::transport::{HttpTransport, StreamTransport};
use crate::worker::{self, ConnectionState, WorkerContext};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

struct Session {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Resilient data source for one internet-radio consumer.
///
/// Events flow to the supplied [`EventSink`]; connection health is exposed
/// through [`state`](Self::state)/[`is_active`](Self::is_active) and the two
/// byte counters survive across sessions (the current-playback counter
/// resets whenever the stream URL changes).
pub struct RadioDataSource {
    transport: Arc<dyn StreamTransport>,
    sink: Arc<dyn EventSink>,
    counters: Arc<ByteCounters>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    session: Mutex<Option<Session>>,
    last_url: std::sync::Mutex<Option<String>>,
}

impl RadioDataSource {
    /// Build a data source over an arbitrary transport.
    pub fn new(transport: Arc<dyn StreamTransport>, sink: Arc<dyn EventSink>) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        Self {
            transport,
            sink,
            counters: Arc::new(ByteCounters::new()),
            state_tx,
            state_rx,
            session: Mutex::new(None),
            last_url: std::sync::Mutex::new(None),
        }
    }

    /// Build a data source over the HTTP transport.
    pub fn with_http(config: TransportConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), sink))
    }

    /// Start playing a source, replacing any running session.
    ///
    /// Resets the current-playback byte counter when the URL differs from
    /// the previous session's URL.
    pub async fn start(&self, source: StreamSource, policy: RetryPolicy) -> Result<()> {
        let mut session = self.session.lock().await;
        self.shutdown_session(session.take()).await;

        {
            let mut last = self.last_url.lock().expect("last_url lock poisoned");
            if last.as_deref() != Some(source.url().as_str()) {
                self.counters.reset_playback();
            }
            *last = Some(source.url().as_str().to_string());
        }

        let cancel = CancellationToken::new();
        self.state_tx.send_replace(ConnectionState::Connecting);
        let ctx = WorkerContext {
            source,
            policy,
            transport: Arc::clone(&self.transport),
            sink: Arc::clone(&self.sink),
            counters: Arc::clone(&self.counters),
            state: self.state_tx.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker::run(ctx));
        *session = Some(Session { cancel, handle });
        Ok(())
    }

    /// Parse a raw URL and start playing it.
    ///
    /// An unparseable URL is rejected here synchronously; no state
    /// transition happens and no events fire.
    pub async fn start_url(&self, url: &str, policy: RetryPolicy) -> Result<()> {
        let source = StreamSource::parse(url)?;
        self.start(source, policy).await
    }

    /// Stop the running session, if any.
    ///
    /// The worker observes cancellation at its next await point; once this
    /// returns, the connection is released and no further events fire.
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;
        let had_session = session.is_some();
        self.shutdown_session(session.take()).await;
        if had_session {
            info!("Radio stream session stopped");
        }
        self.state_tx.send_replace(ConnectionState::Stopped);
    }

    async fn shutdown_session(&self, session: Option<Session>) {
        if let Some(session) = session {
            session.cancel.cancel();
            // The worker terminates within one read timeout or the
            // remaining retry delay; join keeps attempts sequential.
            let _ = session.handle.await;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Whether a session is connecting, streaming or retrying.
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Audio bytes delivered over the lifetime of this instance.
    pub fn total_bytes_transferred(&self) -> u64 {
        self.counters.total_transferred()
    }

    /// Audio bytes delivered since the stream URL last changed.
    pub fn current_playback_bytes_transferred(&self) -> u64 {
        self.counters.current_playback_transferred()
    }

    /// Both counters as one consistent-enough snapshot.
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Watch channel following the lifecycle state.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::events::SourceEvent;
    use crate::info::IcyHeaders;
    use crate::transport::StreamConnection;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Transport that serves a fixed body per URL, then fails every
    /// further attempt.
    struct OneShotTransport {
        bodies: StdMutex<VecDeque<Vec<u8>>>,
    }

    impl OneShotTransport {
        fn new(bodies: Vec<Vec<u8>>) -> Arc<Self> {
            Arc::new(Self {
                bodies: StdMutex::new(bodies.into()),
            })
        }
    }

    #[async_trait::async_trait]
    impl crate::transport::StreamTransport for OneShotTransport {
        async fn open(&self, _source: &StreamSource) -> Result<Box<dyn StreamConnection>> {
            match self.bodies.lock().unwrap().pop_front() {
                Some(body) => Ok(Box::new(OneShotConnection { body: Some(body) })),
                None => Err(Error::Timeout),
            }
        }
    }

    #[derive(Debug)]
    struct OneShotConnection {
        body: Option<Vec<u8>>,
    }

    #[async_trait::async_trait]
    impl StreamConnection for OneShotConnection {
        fn headers(&self) -> &IcyHeaders {
            static HEADERS: IcyHeaders = IcyHeaders {
                metadata_interval: 0,
                station_name: None,
                genre: None,
                station_url: None,
                bitrate_kbps: None,
                content_type: None,
            };
            &HEADERS
        }

        async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
            match self.body.take() {
                Some(body) => Ok(Some(Bytes::from(body))),
                None => Ok(None),
            }
        }
    }

    fn channel_source(
        transport: Arc<OneShotTransport>,
    ) -> (RadioDataSource, mpsc::Receiver<SourceEvent>) {
        let (sink, rx) = crate::events::ChannelSink::new(64);
        (RadioDataSource::new(transport, Arc::new(sink)), rx)
    }

    fn no_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 0,
            retry_delay_secs: 0,
        }
    }

    async fn wait_terminal(rx: &mut mpsc::Receiver<SourceEvent>) {
        loop {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for terminal event")
            {
                Some(SourceEvent::ConnectionLostIrrecoverably) | None => return,
                Some(_) => {}
            }
        }
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_without_state_transition() {
        let (source, mut rx) = channel_source(OneShotTransport::new(vec![]));

        assert!(source.start_url("://missing", no_retry()).await.is_err());
        assert_eq!(source.state(), ConnectionState::Idle);
        assert!(!source.is_active());
        assert!(rx.try_recv().is_err(), "no events may fire");
    }

    #[tokio::test]
    async fn switching_source_resets_playback_counter_only() {
        let (source, mut rx) = channel_source(OneShotTransport::new(vec![
            vec![1u8; 100],
            vec![2u8; 40],
        ]));

        source.start_url("http://radio.test/a", no_retry()).await.unwrap();
        wait_terminal(&mut rx).await;
        assert_eq!(source.total_bytes_transferred(), 100);
        assert_eq!(source.current_playback_bytes_transferred(), 100);

        // Different URL: playback scope resets, lifetime total carries on.
        source.start_url("http://radio.test/b", no_retry()).await.unwrap();
        wait_terminal(&mut rx).await;
        assert_eq!(source.total_bytes_transferred(), 140);
        assert_eq!(source.current_playback_bytes_transferred(), 40);
    }

    #[tokio::test]
    async fn restarting_same_url_keeps_playback_counter() {
        let (source, mut rx) = channel_source(OneShotTransport::new(vec![
            vec![1u8; 30],
            vec![1u8; 30],
        ]));

        source.start_url("http://radio.test/a", no_retry()).await.unwrap();
        wait_terminal(&mut rx).await;
        source.start_url("http://radio.test/a", no_retry()).await.unwrap();
        wait_terminal(&mut rx).await;

        assert_eq!(source.total_bytes_transferred(), 60);
        assert_eq!(source.current_playback_bytes_transferred(), 60);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_terminal() {
        let (source, mut rx) = channel_source(OneShotTransport::new(vec![vec![9u8; 10]]));

        source.start_url("http://radio.test/a", no_retry()).await.unwrap();
        wait_terminal(&mut rx).await;
        source.stop().await;
        assert_eq!(source.state(), ConnectionState::Stopped);
        source.stop().await;
        assert_eq!(source.state(), ConnectionState::Stopped);
        assert!(!source.is_active());
    }
}
