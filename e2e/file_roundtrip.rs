//! E2E: file-backed streams, large payloads, structured records, and the
//! `lz4block` binary.

use std::fs;
use std::io::Cursor;
use std::process::Command;

use lz4block::{
    compress_to_writer, decompress_to_writer, BlockCompressor, BlockDecompressor, CodecError,
};

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

// ─────────────────────────────────────────────────────────────────────────────
// Large payloads
// ─────────────────────────────────────────────────────────────────────────────

/// 10 MiB where the first half is incompressible and the second half is
/// repetitive, so the stream mixes RAW and LZ4 frames.
#[test]
fn ten_mib_mixed_payload_roundtrips() {
    const HALF: usize = 5 * 1024 * 1024;
    let mut input = pseudo_random_bytes(HALF, 0xC0FFEE);
    input.extend(
        b"all work and no play makes for repetitive data "
            .iter()
            .copied()
            .cycle()
            .take(HALF),
    );

    let mut compressed = Vec::new();
    compress_to_writer(
        &mut Cursor::new(&input),
        &mut compressed,
        &mut BlockCompressor::fast(),
    )
    .unwrap();
    // The repetitive half must have shrunk the stream below input size.
    assert!(compressed.len() < input.len());

    let mut output = Vec::new();
    let produced = decompress_to_writer(
        &mut Cursor::new(&compressed),
        &mut output,
        &mut BlockDecompressor::new(),
    )
    .unwrap();
    assert_eq!(produced as usize, input.len());
    assert_eq!(output, input);
}

#[test]
fn store_mode_roundtrips_with_framing_overhead_only() {
    let input = pseudo_random_bytes(300_000, 5);
    let mut compressed = Vec::new();
    compress_to_writer(
        &mut Cursor::new(&input),
        &mut compressed,
        &mut BlockCompressor::store(),
    )
    .unwrap();
    // 64 KiB chunks → ceil(300000 / 65536) data frames + sentinel.
    let frames = 300_000usize.div_ceil(64 * 1024) + 1;
    assert_eq!(compressed.len(), input.len() + frames * 21);

    let mut output = Vec::new();
    decompress_to_writer(
        &mut Cursor::new(&compressed),
        &mut output,
        &mut BlockDecompressor::new(),
    )
    .unwrap();
    assert_eq!(output, input);
}

// ─────────────────────────────────────────────────────────────────────────────
// Structured records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    id: u32,
    flags: u8,
    name: Vec<u8>,
}

impl Record {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.push(self.flags);
        out.extend_from_slice(&(self.name.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.name);
    }

    fn decode(input: &mut &[u8]) -> Record {
        let id = u32::from_le_bytes(input[..4].try_into().unwrap());
        let flags = input[4];
        let name_len = u32::from_le_bytes(input[5..9].try_into().unwrap()) as usize;
        let name = input[9..9 + name_len].to_vec();
        *input = &input[9 + name_len..];
        Record { id, flags, name }
    }
}

#[test]
fn serialized_records_survive_the_codec() {
    let records: Vec<Record> = (0..10)
        .map(|i| Record {
            id: i * 1000 + 7,
            flags: (i % 3) as u8,
            name: format!("record-{i}").into_bytes(),
        })
        .collect();

    let mut serialized = Vec::new();
    for record in &records {
        record.encode(&mut serialized);
    }

    let mut compressed = Vec::new();
    compress_to_writer(
        &mut Cursor::new(&serialized),
        &mut compressed,
        &mut BlockCompressor::high(),
    )
    .unwrap();

    let mut output = Vec::new();
    decompress_to_writer(
        &mut Cursor::new(&compressed),
        &mut output,
        &mut BlockDecompressor::new(),
    )
    .unwrap();

    let mut cursor = &output[..];
    let decoded: Vec<Record> = (0..10).map(|_| Record::decode(&mut cursor)).collect();
    assert!(cursor.is_empty());
    assert_eq!(decoded, records);
}

// ─────────────────────────────────────────────────────────────────────────────
// Files and the CLI binary
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn file_to_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("input.bin");
    let packed = dir.path().join("input.bin.lz4b");

    let input = pseudo_random_bytes(200_000, 77);
    fs::write(&plain, &input).unwrap();

    {
        let mut src = fs::File::open(&plain).unwrap();
        let mut dst = fs::File::create(&packed).unwrap();
        compress_to_writer(&mut src, &mut dst, &mut BlockCompressor::fast()).unwrap();
    }
    {
        let mut src = fs::File::open(&packed).unwrap();
        let mut out = Vec::new();
        decompress_to_writer(&mut src, &mut out, &mut BlockDecompressor::new()).unwrap();
        assert_eq!(out, input);
    }
}

#[test]
fn trailing_garbage_in_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let packed = dir.path().join("bad.lz4b");

    let mut compressed = Vec::new();
    compress_to_writer(
        &mut Cursor::new(b"TestData".to_vec()),
        &mut compressed,
        &mut BlockCompressor::fast(),
    )
    .unwrap();
    compressed.extend_from_slice(&[0u8; 10]);
    fs::write(&packed, &compressed).unwrap();

    let mut src = fs::File::open(&packed).unwrap();
    let err = decompress_to_writer(&mut src, &mut Vec::new(), &mut BlockDecompressor::new())
        .unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedTrailingData));
}

#[test]
fn cli_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("corpus.txt");
    let packed = dir.path().join("corpus.txt.lz4b");
    let restored = dir.path().join("corpus.restored.txt");

    let input: Vec<u8> = b"the quick brown fox jumps over the lazy dog\n"
        .iter()
        .copied()
        .cycle()
        .take(100_000)
        .collect();
    fs::write(&plain, &input).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_lz4block"))
        .arg(&plain)
        .arg("-o")
        .arg(&packed)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(fs::metadata(&packed).unwrap().len() < input.len() as u64);

    let status = Command::new(env!("CARGO_BIN_EXE_lz4block"))
        .arg("-d")
        .arg(&packed)
        .arg("-o")
        .arg(&restored)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(fs::read(&restored).unwrap(), input);
}

#[test]
fn cli_rejects_corrupt_input() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.lz4b");
    fs::write(&bogus, b"this is not a block stream").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lz4block"))
        .arg("-d")
        .arg(&bogus)
        .arg("-o")
        .arg(dir.path().join("out.bin"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_refuses_to_clobber_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("in.txt");
    let existing = dir.path().join("out.lz4b");
    fs::write(&plain, b"data").unwrap();
    fs::write(&existing, b"precious").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lz4block"))
        .arg(&plain)
        .arg("-o")
        .arg(&existing)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(fs::read(&existing).unwrap(), b"precious");
}
