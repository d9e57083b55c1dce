//! ICY frame demultiplexer.
//!
//! With a metadata interval of `N > 0` the wire format is `N` audio bytes,
//! one length byte `L`, then `L * 16` payload bytes, repeating.  The
//! demultiplexer is an incremental cursor over that framing: it accepts
//! arbitrarily sliced network chunks and yields whole audio runs plus parsed
//! metadata blocks, without copying the audio path.

use crate::info::ShoutcastInfo;
use bytes::Bytes;
use tracing::debug;

/// One item produced by the demultiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxItem {
    /// A run of raw audio bytes, to be counted and handed downstream.
    Audio(Bytes),
    /// One successfully parsed inline metadata block.
    ///
    /// Empty (`L = 0`) and malformed blocks produce no item at all.
    Metadata(ShoutcastInfo),
}

enum Cursor {
    /// Plain audio until the next metadata block.
    Audio { remaining: usize },
    /// Expecting the single block length byte.
    MetaLength,
    /// Accumulating the block payload.
    MetaPayload { expected: usize, buf: Vec<u8> },
}

/// Incremental splitter for one connection.
///
/// The metadata interval is fixed for the lifetime of the connection; a
/// reconnect renegotiates it and gets a fresh demultiplexer.
pub struct IcyDemuxer {
    interval: usize,
    cursor: Cursor,
}

impl IcyDemuxer {
    /// Create a demultiplexer for a declared metadata interval.
    ///
    /// An interval of 0 means the server interleaves no metadata; every
    /// byte passes through as audio.
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            cursor: Cursor::Audio {
                remaining: interval,
            },
        }
    }

    /// Feed one network chunk, appending produced items to `out`.
    pub fn push(&mut self, mut chunk: Bytes, out: &mut Vec<DemuxItem>) {
        if self.interval == 0 {
            if !chunk.is_empty() {
                out.push(DemuxItem::Audio(chunk));
            }
            return;
        }

        while !chunk.is_empty() {
            match &mut self.cursor {
                Cursor::Audio { remaining } => {
                    let take = (*remaining).min(chunk.len());
                    let run = chunk.split_to(take);
                    *remaining -= take;
                    if *remaining == 0 {
                        self.cursor = Cursor::MetaLength;
                    }
                    if !run.is_empty() {
                        out.push(DemuxItem::Audio(run));
                    }
                }
                Cursor::MetaLength => {
                    let len_byte = chunk.split_to(1)[0];
                    let expected = len_byte as usize * 16;
                    if expected == 0 {
                        // Empty block, nothing this cycle.
                        self.cursor = Cursor::Audio {
                            remaining: self.interval,
                        };
                    } else {
                        self.cursor = Cursor::MetaPayload {
                            expected,
                            buf: Vec::with_capacity(expected),
                        };
                    }
                }
                Cursor::MetaPayload { expected, buf } => {
                    let need = *expected - buf.len();
                    let take = need.min(chunk.len());
                    buf.extend_from_slice(&chunk.split_to(take));
                    if buf.len() == *expected {
                        match ShoutcastInfo::from_metadata_block(buf) {
                            Some(info) => out.push(DemuxItem::Metadata(info)),
                            None => debug!(
                                len = *expected,
                                "Skipping unparseable metadata block"
                            ),
                        }
                        self.cursor = Cursor::Audio {
                            remaining: self.interval,
                        };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(demux: &mut IcyDemuxer, data: Vec<u8>) -> Vec<DemuxItem> {
        let mut out = Vec::new();
        demux.push(Bytes::from(data), &mut out);
        out
    }

    fn audio_len(item: &DemuxItem) -> usize {
        match item {
            DemuxItem::Audio(run) => run.len(),
            other => panic!("expected audio run, got {other:?}"),
        }
    }

    /// `[100 audio][len=2][32 byte payload][100 audio]` yields two 100-byte
    /// runs and exactly one metadata item with `StreamTitle = "X"`.
    #[test]
    fn interleaved_metadata_round_trip() {
        let mut stream = vec![0xAAu8; 100];
        stream.push(2);
        let mut payload = b"StreamTitle='X';".to_vec();
        payload.resize(32, 0);
        stream.extend_from_slice(&payload);
        stream.extend_from_slice(&[0xBBu8; 100]);

        let mut demux = IcyDemuxer::new(100);
        let items = drain(&mut demux, stream);

        assert_eq!(items.len(), 3);
        assert_eq!(audio_len(&items[0]), 100);
        match &items[1] {
            DemuxItem::Metadata(info) => assert_eq!(info.stream_title.as_deref(), Some("X")),
            other => panic!("expected metadata, got {other:?}"),
        }
        assert_eq!(audio_len(&items[2]), 100);
    }

    #[test]
    fn empty_block_is_skipped_silently() {
        let mut stream = vec![1u8; 10];
        stream.push(0); // L = 0
        stream.extend_from_slice(&[2u8; 10]);

        let mut demux = IcyDemuxer::new(10);
        let items = drain(&mut demux, stream);

        assert_eq!(items.len(), 2);
        assert_eq!(audio_len(&items[0]), 10);
        assert_eq!(audio_len(&items[1]), 10);
    }

    #[test]
    fn malformed_block_drops_info_but_keeps_audio_intact() {
        let mut stream = vec![7u8; 10];
        stream.push(1);
        stream.extend_from_slice(b"no assignments.."); // 16 bytes, not key='value'
        stream.extend_from_slice(&[9u8; 10]);

        let mut demux = IcyDemuxer::new(10);
        let items = drain(&mut demux, stream);

        assert_eq!(items.len(), 2);
        match (&items[0], &items[1]) {
            (DemuxItem::Audio(a), DemuxItem::Audio(b)) => {
                assert_eq!(a.as_ref(), &[7u8; 10]);
                assert_eq!(b.as_ref(), &[9u8; 10]);
            }
            other => panic!("expected two audio runs, got {other:?}"),
        }
    }

    #[test]
    fn zero_interval_is_passthrough() {
        let mut demux = IcyDemuxer::new(0);
        // Byte values that would look like framing are plain audio here.
        let items = drain(&mut demux, vec![0, 1, 2, 3, 16, 0]);
        assert_eq!(items.len(), 1);
        assert_eq!(audio_len(&items[0]), 6);
    }

    #[test]
    fn framing_survives_arbitrary_chunking() {
        // Same wire bytes as the round-trip test, fed one byte at a time.
        let mut stream = vec![0x11u8; 20];
        stream.push(1);
        stream.extend_from_slice(b"StreamTitle='a';");
        stream.extend_from_slice(&[0x22u8; 20]);

        let mut demux = IcyDemuxer::new(20);
        let mut items = Vec::new();
        for byte in stream {
            demux.push(Bytes::from(vec![byte]), &mut items);
        }

        let audio_total: usize = items
            .iter()
            .filter(|i| matches!(i, DemuxItem::Audio(_)))
            .map(audio_len)
            .sum();
        assert_eq!(audio_total, 40);

        let titles: Vec<_> = items
            .iter()
            .filter_map(|i| match i {
                DemuxItem::Metadata(info) => info.stream_title.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(titles, vec!["a".to_string()]);
    }

    #[test]
    fn repeating_cycles_keep_interval() {
        let mut stream = Vec::new();
        for round in 0..3u8 {
            stream.extend_from_slice(&vec![round; 8]);
            stream.push(1);
            stream.extend_from_slice(b"StreamTitle='t';");
        }

        let mut demux = IcyDemuxer::new(8);
        let items = drain(&mut demux, stream);

        let audio_runs = items
            .iter()
            .filter(|i| matches!(i, DemuxItem::Audio(_)))
            .count();
        let meta_blocks = items
            .iter()
            .filter(|i| matches!(i, DemuxItem::Metadata(_)))
            .count();
        assert_eq!(audio_runs, 3);
        assert_eq!(meta_blocks, 3);
    }

    #[test]
    fn metadata_bytes_never_leak_into_audio() {
        let mut stream = vec![0xFFu8; 4];
        stream.push(1);
        stream.extend_from_slice(b"StreamTitle='m';");
        stream.extend_from_slice(&[0xEEu8; 4]);

        let mut demux = IcyDemuxer::new(4);
        let items = drain(&mut demux, stream);

        let mut audio = Vec::new();
        for item in &items {
            if let DemuxItem::Audio(run) = item {
                audio.extend_from_slice(run);
            }
        }
        assert_eq!(audio, [[0xFFu8; 4].as_slice(), [0xEEu8; 4].as_slice()].concat());
    }
}
