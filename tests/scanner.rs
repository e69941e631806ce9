//! FrameScanner integration tests.
//!
//! All streams are synthetic and built in memory, so these tests need no
//! fixtures and no `ffmpeg`.

use std::collections::VecDeque;
use std::io::Cursor;

use framepipe::{
    ByteSource, FramePipeError, FrameScanner, PNG_END, PNG_START, ReaderSource,
};

fn segment(body: &[u8]) -> Vec<u8> {
    let mut bytes = PNG_START.as_bytes().to_vec();
    bytes.extend_from_slice(body);
    bytes.extend_from_slice(PNG_END.as_bytes());
    bytes
}

/// Three payloads with junk before the first one and between the others.
fn sample_stream() -> (Vec<u8>, Vec<Vec<u8>>) {
    let payloads = vec![
        segment(b"first frame body"),
        segment(&[0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N']),
        segment(&(0..=255).collect::<Vec<u8>>()),
    ];
    let mut stream = b"ffmpeg banner junk".to_vec();
    stream.extend_from_slice(&payloads[0]);
    stream.extend_from_slice(&payloads[1]);
    stream.extend_from_slice(b"\x89PN");
    stream.extend_from_slice(&payloads[2]);
    (stream, payloads)
}

fn scan_all<S: ByteSource>(scanner: &mut FrameScanner<S>) -> Vec<Vec<u8>> {
    let mut payloads = Vec::new();
    while let Some(payload) = scanner.next_payload().expect("scan failed") {
        payloads.push(payload);
    }
    payloads
}

/// Hands out a fixed sequence of reads, then reports end-of-stream. A
/// `None` step is a read that returns nothing without ending the stream.
struct ScriptedSource {
    steps: VecDeque<Option<Vec<u8>>>,
    finished: bool,
}

impl ScriptedSource {
    fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self::with_stalls(chunks.into_iter().map(Some).collect())
    }

    fn with_stalls(steps: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            steps: steps.into(),
            finished: false,
        }
    }
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.steps.pop_front() {
            Some(Some(chunk)) => {
                assert!(chunk.len() <= buf.len(), "scripted chunk larger than read");
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            Some(None) => Ok(0),
            None => {
                self.finished = true;
                Ok(0)
            }
        }
    }

    fn at_end(&self) -> bool {
        self.finished
    }
}

// ── ordering and termination ───────────────────────────────────────

#[test]
fn returns_each_payload_in_order_then_end() {
    let (stream, expected) = sample_stream();
    let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(stream.clone())));

    for payload in &expected {
        assert_eq!(scanner.next_payload().unwrap().as_ref(), Some(payload));
    }
    assert!(scanner.next_payload().unwrap().is_none());
    assert!(
        scanner.next_payload().unwrap().is_none(),
        "end-of-stream should be sticky"
    );
    assert_eq!(scanner.frames_extracted(), 3);
    assert_eq!(scanner.bytes_read(), stream.len() as u64);
}

#[test]
fn empty_stream_is_end() {
    let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(Vec::new())));
    assert!(scanner.next_payload().unwrap().is_none());
    assert_eq!(scanner.frames_extracted(), 0);
}

#[test]
fn stream_of_junk_only_is_end() {
    let junk = vec![0x42; 10_000];
    let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(junk)));
    assert!(scanner.next_payload().unwrap().is_none());
}

// ── chunk-size invariance ──────────────────────────────────────────

#[test]
fn chunk_size_does_not_change_payloads() {
    let (stream, expected) = sample_stream();

    for chunk_size in [1, 2, 3, 7, 8, 11, 12, 13, 64, 1024, stream.len()] {
        let source = ReaderSource::new(Cursor::new(stream.clone()));
        let mut scanner = FrameScanner::with_chunk_size(source, chunk_size);
        assert_eq!(
            scan_all(&mut scanner),
            expected,
            "chunk size {chunk_size} changed the result"
        );
    }
}

#[test]
fn zero_chunk_size_is_clamped() {
    let source = ReaderSource::new(Cursor::new(segment(b"x")));
    let mut scanner = FrameScanner::with_chunk_size(source, 0);
    assert_eq!(scanner.chunk_size(), 1);
    assert_eq!(scan_all(&mut scanner).len(), 1);
}

// ── marker boundaries ──────────────────────────────────────────────

#[test]
fn start_marker_split_across_chunks_is_found() {
    let payload = segment(b"straddle");
    let mut first = b"junk".to_vec();
    first.extend_from_slice(&payload[..3]);
    let second = payload[3..].to_vec();

    let mut scanner =
        FrameScanner::with_chunk_size(ScriptedSource::new(vec![first, second]), 64);
    assert_eq!(scanner.next_payload().unwrap(), Some(payload));
}

#[test]
fn end_marker_split_across_chunks_is_found() {
    let payload = segment(b"body");
    let split = payload.len() - 5;
    let chunks = vec![payload[..split].to_vec(), payload[split..].to_vec()];

    let mut scanner = FrameScanner::with_chunk_size(ScriptedSource::new(chunks), 64);
    assert_eq!(scanner.next_payload().unwrap(), Some(payload));
}

#[test]
fn buffer_ending_exactly_at_start_marker_reads_more() {
    let payload = segment(b"after the boundary");
    let chunks = vec![
        PNG_START.as_bytes().to_vec(),
        payload[PNG_START.len()..].to_vec(),
    ];

    let mut scanner = FrameScanner::with_chunk_size(ScriptedSource::new(chunks), 64);
    assert_eq!(scanner.next_payload().unwrap(), Some(payload));
}

#[test]
fn first_start_marker_wins_over_later_ones() {
    let mut body = b"abc".to_vec();
    body.extend_from_slice(PNG_START.as_bytes());
    body.extend_from_slice(b"def");
    let payload = segment(&body);

    let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(payload.clone())));
    let found = scanner.next_payload().unwrap().expect("payload");
    assert_eq!(found, payload);
    assert!(scanner.next_payload().unwrap().is_none());
}

// ── truncation and discard ─────────────────────────────────────────

#[test]
fn truncated_trailing_frame_is_dropped() {
    let complete = segment(b"complete");
    let mut stream = complete.clone();
    stream.extend_from_slice(PNG_START.as_bytes());
    stream.extend_from_slice(b"partial payload with no trailer");

    for chunk_size in [1, 5, 1024] {
        let source = ReaderSource::new(Cursor::new(stream.clone()));
        let mut scanner = FrameScanner::with_chunk_size(source, chunk_size);
        assert_eq!(scanner.next_payload().unwrap(), Some(complete.clone()));
        assert!(scanner.next_payload().unwrap().is_none());
        assert_eq!(scanner.frames_extracted(), 1);
    }
}

#[test]
fn stream_cut_inside_start_marker_is_end() {
    let mut stream = segment(b"one");
    stream.extend_from_slice(&PNG_START.as_bytes()[..5]);

    let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(stream)));
    assert!(scanner.next_payload().unwrap().is_some());
    assert!(scanner.next_payload().unwrap().is_none());
}

#[test]
fn returned_span_is_removed_from_buffer() {
    let first = segment(b"one");
    let second = segment(b"two");
    let mut stream = b"lead".to_vec();
    stream.extend_from_slice(&first);
    stream.extend_from_slice(b"gap");
    stream.extend_from_slice(&second);

    let source = ReaderSource::new(Cursor::new(stream.clone()));
    let mut scanner = FrameScanner::with_chunk_size(source, stream.len());
    assert_eq!(scanner.next_payload().unwrap(), Some(first));

    // Everything up to and including the first trailer is gone.
    let mut rest = b"gap".to_vec();
    rest.extend_from_slice(&second);
    assert_eq!(scanner.buffered(), rest.as_slice());

    assert_eq!(scanner.next_payload().unwrap(), Some(second));
    assert!(scanner.buffered().is_empty());
}

#[test]
fn consumer_sees_payload_in_place() {
    let payload = segment(b"borrowed");
    let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(payload.clone())));

    let length = scanner
        .next_payload_with(|bytes| {
            assert!(bytes.starts_with(PNG_START.as_bytes()));
            assert!(bytes.ends_with(PNG_END.as_bytes()));
            bytes.len()
        })
        .unwrap();
    assert_eq!(length, Some(payload.len()));
    assert!(scanner.buffered().is_empty());
}

// ── stalled sources ────────────────────────────────────────────────

#[test]
fn stalled_source_is_reported_and_resumable() {
    let payload = segment(b"late");
    let source = ScriptedSource::with_stalls(vec![None, None, Some(payload.clone())]);
    let mut scanner = FrameScanner::with_chunk_size(source, 64);

    for _ in 0..2 {
        match scanner.next_payload() {
            Err(error @ FramePipeError::SourceStalled { .. }) => {
                assert!(error.is_recoverable());
            }
            other => panic!("expected a stall, got {other:?}"),
        }
    }
    assert_eq!(scanner.next_payload().unwrap(), Some(payload));
    assert!(scanner.next_payload().unwrap().is_none());
}

#[test]
fn stall_mid_frame_keeps_buffered_bytes() {
    let payload = segment(b"split by a stall");
    let source = ScriptedSource::with_stalls(vec![
        Some(payload[..10].to_vec()),
        None,
        Some(payload[10..].to_vec()),
    ]);
    let mut scanner = FrameScanner::with_chunk_size(source, 64);

    match scanner.next_payload() {
        Err(FramePipeError::SourceStalled { bytes_read }) => assert_eq!(bytes_read, 10),
        other => panic!("expected a stall, got {other:?}"),
    }
    assert_eq!(scanner.buffered(), &payload[..10]);
    assert_eq!(scanner.next_payload().unwrap(), Some(payload));
}
