//! Connect to a radio stream and print connection and now-playing events.
//!
//! Usage: `cargo run --example now_playing -- <stream-url>`

use std::sync::Arc;

use icysource::{ChannelSink, RadioDataSource, RetryPolicy, SourceEvent, TransportConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "icysource=info".into()),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://stream.radioparadise.com/mp3-128".to_string());

    let (sink, mut events) = ChannelSink::new(64);
    let source = RadioDataSource::with_http(TransportConfig::default(), Arc::new(sink))?;
    source.start_url(&url, RetryPolicy::default()).await?;

    println!("Listening to {url} (ctrl-c to quit)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SourceEvent::Connected { headers } => {
                        println!(
                            "Connected: {} ({} kbps, metaint {})",
                            headers.station_name.as_deref().unwrap_or("<unnamed station>"),
                            headers.bitrate_kbps.map_or("?".to_string(), |b| b.to_string()),
                            headers.metadata_interval,
                        );
                    }
                    SourceEvent::StreamLiveInfo(live) => {
                        match (&live.artist, &live.track) {
                            (Some(artist), Some(track)) => println!("♪ {artist} - {track}"),
                            _ => println!("♪ {}", live.title),
                        }
                    }
                    SourceEvent::ConnectionLost => println!("Connection lost, retrying..."),
                    SourceEvent::ConnectionLostIrrecoverably => {
                        eprintln!("Gave up after exhausting retries");
                        break;
                    }
                    SourceEvent::ShoutcastInfo(_) | SourceEvent::BytesRead { .. } => {}
                }
            }
        }
    }

    source.stop().await;
    println!(
        "Transferred {} bytes this session, {} total",
        source.current_playback_bytes_transferred(),
        source.total_bytes_transferred(),
    );
    Ok(())
}
