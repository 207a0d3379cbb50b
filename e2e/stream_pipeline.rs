//! E2E: channel-driven pipelines.
//!
//! Runs whole streams through [`StreamCompressor`] and
//! [`StreamDecompressor`] wired with crossbeam channels, the way a transport
//! pipeline would, and checks ordering, end-of-stream behavior, trailing
//! data, and inspector accounting.

use crossbeam_channel::unbounded;
use lz4block::{
    BlockCompressor, BlockDecompressor, CodecError, StreamCompressor, StreamDecompressor,
    HEADER_LENGTH,
};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn pseudo_random_bytes(len: usize, mut state: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        out.extend_from_slice(&state.to_le_bytes());
    }
    out.truncate(len);
    out
}

/// Run the compressor driver over `chunks`, returning the emitted frames.
fn compress_chunks(enc: BlockCompressor, chunks: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let (in_tx, in_rx) = unbounded();
    let (out_tx, out_rx) = unbounded();
    for chunk in chunks {
        in_tx.send(chunk.clone()).unwrap();
    }
    drop(in_tx);
    StreamCompressor::new(enc).run(in_rx, out_tx).unwrap();
    out_rx.into_iter().collect()
}

/// Run the decompressor driver over `chunks`, returning the payloads.
fn decompress_chunks(chunks: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, CodecError> {
    let (in_tx, in_rx) = unbounded();
    let (out_tx, out_rx) = unbounded();
    for chunk in chunks {
        in_tx.send(chunk).unwrap();
    }
    drop(in_tx);
    StreamDecompressor::new(BlockDecompressor::new()).run(in_rx, out_tx)?;
    Ok(out_rx.into_iter().collect())
}

/// Split `bytes` into pieces whose sizes cycle through `[64, 128]`.
fn rechunk(bytes: &[u8], mut state: u64) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        state = state.wrapping_mul(0x5DEE_CE66D).wrapping_add(11);
        let size = 64 + (state % 65) as usize; // 64..=128
        let end = (offset + size).min(bytes.len());
        chunks.push(bytes[offset..end].to_vec());
        offset = end;
    }
    chunks
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: many small buffers, rechunked on the wire
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn hundred_small_buffers_rechunked_roundtrip() {
    // 100 buffers of length 0..=100; empty ones produce no frame.
    let buffers: Vec<Vec<u8>> = (0..100)
        .map(|i| pseudo_random_bytes(i % 101, i as u64 + 1))
        .collect();
    let expected: Vec<u8> = buffers.iter().flatten().copied().collect();

    let frames = compress_chunks(BlockCompressor::fast(), &buffers);
    let wire: Vec<u8> = frames.iter().flatten().copied().collect();

    // Arbitrary 64-128 byte fragmentation between the two drivers.
    let payloads = decompress_chunks(rechunk(&wire, 42)).unwrap();
    let actual: Vec<u8> = payloads.iter().flatten().copied().collect();
    assert_eq!(actual, expected);

    // One frame per non-empty buffer, plus the sentinel.
    let non_empty = buffers.iter().filter(|b| !b.is_empty()).count();
    assert_eq!(frames.len(), non_empty + 1);
}

#[test]
fn single_byte_fragmentation_between_drivers() {
    let buffers = vec![b"TestData".to_vec(), vec![b'x'; 3000]];
    let frames = compress_chunks(BlockCompressor::fast(), &buffers);
    let wire: Vec<u8> = frames.iter().flatten().copied().collect();

    let one_byte_chunks: Vec<Vec<u8>> = wire.iter().map(|b| vec![*b]).collect();
    let payloads = decompress_chunks(one_byte_chunks).unwrap();
    assert_eq!(payloads, buffers);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: single tiny payload across every mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn one_byte_payload_identical_across_modes() {
    let encoders = [
        BlockCompressor::fast(),
        BlockCompressor::high(),
        BlockCompressor::high_with_level(10),
    ];
    let mut streams = Vec::new();
    for enc in encoders {
        let frames = compress_chunks(enc, &[b"1".to_vec()]);
        let wire: Vec<u8> = frames.iter().flatten().copied().collect();
        assert_eq!(decompress_chunks(vec![wire.clone()]).unwrap(), vec![b"1".to_vec()]);
        streams.push(wire);
    }
    // A one-byte payload cannot shrink, so every mode emits the same RAW
    // frame and the streams are byte-identical.
    assert_eq!(streams[0], streams[1]);
    assert_eq!(streams[1], streams[2]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: empty stream
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn empty_stream_is_a_lone_sentinel() {
    let frames = compress_chunks(BlockCompressor::fast(), &[]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), HEADER_LENGTH);

    let payloads = decompress_chunks(frames).unwrap();
    assert!(payloads.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: trailing data and truncation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn ten_zero_bytes_after_sentinel_fail_as_trailing_data() {
    let mut frames = compress_chunks(BlockCompressor::fast(), &[b"TestData".to_vec()]);
    frames.push(vec![0u8; 10]);
    let err = decompress_chunks(frames).unwrap_err();
    assert!(
        matches!(err, CodecError::UnexpectedTrailingData),
        "got {err:?}"
    );
}

#[test]
fn upstream_hangup_before_sentinel_fails_as_corrupted() {
    let mut frames = compress_chunks(BlockCompressor::fast(), &[b"TestData".to_vec()]);
    frames.pop(); // drop the sentinel
    let err = decompress_chunks(frames).unwrap_err();
    assert!(matches!(err, CodecError::Corrupted(_)), "got {err:?}");
}

// ─────────────────────────────────────────────────────────────────────────────
// Backpressured pipeline across threads
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bounded_channels_roundtrip_across_threads() {
    use crossbeam_channel::bounded;
    use std::thread;

    let input: Vec<Vec<u8>> = (0..50)
        .map(|i| pseudo_random_bytes(512 + i * 7, i as u64))
        .collect();
    let expected: Vec<u8> = input.iter().flatten().copied().collect();

    let (chunk_tx, chunk_rx) = bounded(1);
    let (wire_tx, wire_rx) = bounded(1);
    let (out_tx, out_rx) = bounded(1);

    let feeder = thread::spawn(move || {
        for chunk in input {
            chunk_tx.send(chunk).unwrap();
        }
    });
    let compressor = thread::spawn(move || {
        StreamCompressor::new(BlockCompressor::fast()).run(chunk_rx, wire_tx)
    });
    let decompressor = thread::spawn(move || {
        StreamDecompressor::new(BlockDecompressor::new()).run(wire_rx, out_tx)
    });

    let actual: Vec<u8> = out_rx.into_iter().flatten().collect();
    feeder.join().unwrap();
    compressor.join().unwrap().unwrap();
    decompressor.join().unwrap().unwrap();
    assert_eq!(actual, expected);
}
