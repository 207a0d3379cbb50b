//! Blocking `Read`/`Write` adapters around the block codec.
//!
//! These mirror the channel drivers for callers that hold plain I/O streams
//! (the CLI, file-backed tests): each full read becomes one frame, and
//! decoding applies the same end-of-stream and trailing-data rules as
//! [`StreamDecompressor`](super::StreamDecompressor).

use std::io::{self, Read, Write};

use crate::block::compress::BlockCompressor;
use crate::block::decompress::{Block, BlockDecompressor};
use crate::block::types::CodecError;
use crate::queue::ByteQueue;

/// Read chunk size.  Each filled chunk becomes its own frame, so this also
/// bounds the block size these adapters produce.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compress everything readable from `src` into a framed block stream on
/// `dst`, ending with the sentinel frame.
///
/// Returns the number of compressed bytes written, sentinel included.
///
/// # Errors
///
/// Read failures map to [`CodecError::Upstream`], write failures to
/// [`CodecError::Downstream`].
pub fn compress_to_writer(
    src: &mut impl Read,
    dst: &mut impl Write,
    block: &mut BlockCompressor,
) -> Result<u64, CodecError> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = read_chunk(src, &mut chunk)?;
        if n == 0 {
            break;
        }
        let frame = block.compress(&chunk[..n]);
        dst.write_all(&frame).map_err(CodecError::Downstream)?;
        written += frame.len() as u64;
    }
    let sentinel = block.end_of_stream();
    dst.write_all(&sentinel).map_err(CodecError::Downstream)?;
    Ok(written + sentinel.len() as u64)
}

/// Decode a framed block stream from `src`, writing payloads to `dst`.
///
/// Returns the number of decompressed bytes written.
///
/// # Errors
///
/// [`CodecError::Corrupted`] on malformed frames or when `src` ends before
/// the sentinel frame; [`CodecError::UnexpectedTrailingData`] when bytes
/// follow the sentinel; `Upstream`/`Downstream` for I/O failures.
pub fn decompress_to_writer(
    src: &mut impl Read,
    dst: &mut impl Write,
    block: &mut BlockDecompressor,
) -> Result<u64, CodecError> {
    let mut queue = ByteQueue::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut produced = 0u64;
    loop {
        // Drain every complete frame already buffered.
        loop {
            match block.try_decompress(&mut queue)? {
                None => break,
                Some(Block::Data(payload)) => {
                    produced += payload.len() as u64;
                    dst.write_all(&payload).map_err(CodecError::Downstream)?;
                }
                Some(Block::EndOfStream) => {
                    if !queue.is_empty() || read_some(src, &mut chunk)? != 0 {
                        return Err(CodecError::UnexpectedTrailingData);
                    }
                    return Ok(produced);
                }
            }
        }

        let n = read_some(src, &mut chunk)?;
        if n == 0 {
            return Err(CodecError::Corrupted(
                "stream ended before end-of-stream block",
            ));
        }
        queue.push(chunk[..n].to_vec());
    }
}

/// Fill `buf` as far as the reader allows (short only at end of input).
fn read_chunk(src: &mut impl Read, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut total = 0;
    while total < buf.len() {
        match src.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Upstream(e)),
        }
    }
    Ok(total)
}

/// One read of whatever is available; 0 means end of input.
fn read_some(src: &mut impl Read, buf: &mut [u8]) -> Result<usize, CodecError> {
    loop {
        match src.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Upstream(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) -> Vec<u8> {
        let mut compressed = Vec::new();
        compress_to_writer(
            &mut &input[..],
            &mut compressed,
            &mut BlockCompressor::fast(),
        )
        .unwrap();

        let mut output = Vec::new();
        let n = decompress_to_writer(
            &mut &compressed[..],
            &mut output,
            &mut BlockDecompressor::new(),
        )
        .unwrap();
        assert_eq!(n as usize, output.len());
        output
    }

    #[test]
    fn empty_input_roundtrips_to_empty_output() {
        assert!(roundtrip(b"").is_empty());
    }

    #[test]
    fn small_input_roundtrips() {
        assert_eq!(roundtrip(b"1"), b"1");
        assert_eq!(roundtrip(b"TestData"), b"TestData");
    }

    #[test]
    fn multi_chunk_input_roundtrips() {
        // Three full chunks plus a partial one.
        let input: Vec<u8> = (0..CHUNK_SIZE * 3 + 123)
            .map(|i| (i % 251) as u8)
            .collect();
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn truncated_input_is_corrupted() {
        let mut compressed = Vec::new();
        compress_to_writer(
            &mut &b"TestData"[..],
            &mut compressed,
            &mut BlockCompressor::fast(),
        )
        .unwrap();
        compressed.truncate(compressed.len() - 1);

        let err = decompress_to_writer(
            &mut &compressed[..],
            &mut Vec::new(),
            &mut BlockDecompressor::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::Corrupted(_)));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut compressed = Vec::new();
        compress_to_writer(
            &mut &b"TestData"[..],
            &mut compressed,
            &mut BlockCompressor::fast(),
        )
        .unwrap();
        compressed.extend_from_slice(&[0u8; 10]);

        let err = decompress_to_writer(
            &mut &compressed[..],
            &mut Vec::new(),
            &mut BlockDecompressor::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedTrailingData));
    }
}
