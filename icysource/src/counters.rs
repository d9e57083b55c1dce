//! Byte accounting.
//!
//! Two scopes: lifetime of the data source instance, and current playback
//! (reset when the stream URL changes between sessions).  The worker task is
//! the only writer; readers take lock-free snapshots and never block it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Audio byte counters for one data source instance.
///
/// Only audio bytes delivered downstream are recorded; metadata block bytes
/// are excluded.  `current_playback ≤ total` holds at all times.
#[derive(Debug, Default)]
pub struct ByteCounters {
    total: AtomicU64,
    current_playback: AtomicU64,
}

/// Immutable view of both counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total_transferred: u64,
    pub current_playback_transferred: u64,
}

impl ByteCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one delivered audio run.
    pub fn record(&self, len: u64) {
        self.total.fetch_add(len, Ordering::Relaxed);
        self.current_playback.fetch_add(len, Ordering::Relaxed);
    }

    /// Reset the current-playback scope; the lifetime total is untouched.
    pub fn reset_playback(&self) {
        self.current_playback.store(0, Ordering::Relaxed);
    }

    pub fn total_transferred(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn current_playback_transferred(&self) -> u64 {
        self.current_playback.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_transferred: self.total_transferred(),
            current_playback_transferred: self.current_playback_transferred(),
        }
    }
}
