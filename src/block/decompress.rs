//! Block decoder: an incremental state machine over a [`ByteQueue`].
//!
//! [`BlockDecompressor::try_decompress`] consumes at most one complete frame
//! per call and consumes nothing while a frame is still partial, so input
//! may be fragmented arbitrarily — headers and bodies can straddle any
//! number of queued buffers.  Validation failures are terminal.

use crate::lz4;
use crate::queue::ByteQueue;
use crate::xxhash::{Xxh32State, CHECKSUM_SEED};

use super::types::{
    read_le32, CodecError, CompressionMethod, CHECKSUM_OFFSET, COMPRESSED_LEN_OFFSET,
    COMPRESSION_LEVEL_BASE, HEADER_LENGTH, MAGIC, MAGIC_LENGTH, ORIGINAL_LEN_OFFSET, TOKEN_OFFSET,
};

/// Outcome of decoding one complete frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// The decompressed payload of a data frame.
    Data(Vec<u8>),
    /// The end-of-stream frame.
    EndOfStream,
}

/// Decodes framed blocks from a byte queue.
///
/// The decoder owns the per-frame header fields and a streaming XXH32
/// hasher; the queue is a collaborator owned by the caller.  After the
/// end-of-stream frame has been consumed, [`is_finished`] reports `true` and
/// the caller is responsible for rejecting any further input (the streaming
/// drivers report it as [`CodecError::UnexpectedTrailingData`]).
///
/// [`is_finished`]: BlockDecompressor::is_finished
pub struct BlockDecompressor {
    original_len: i32,
    compressed_len: i32,
    method: CompressionMethod,
    check: u32,
    finished: bool,
    custom_end_of_stream: bool,
    hasher: Xxh32State,
}

impl Default for BlockDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDecompressor {
    pub fn new() -> Self {
        BlockDecompressor {
            original_len: 0,
            compressed_len: 0,
            method: CompressionMethod::Raw,
            check: 0,
            finished: false,
            custom_end_of_stream: false,
            hasher: Xxh32State::new(CHECKSUM_SEED),
        }
    }

    /// Accepted for symmetry with the encoder's flag.  Both end-of-stream
    /// encodings are identical on the wire, so acceptance does not depend on
    /// it.
    pub fn with_custom_end_of_stream(mut self, custom: bool) -> Self {
        self.custom_end_of_stream = custom;
        self
    }

    /// Whether the symmetric end-of-stream flag is set.
    pub fn custom_end_of_stream(&self) -> bool {
        self.custom_end_of_stream
    }

    /// Whether the end-of-stream frame has been consumed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Attempt to decode one frame from `queue`.
    ///
    /// Returns `Ok(None)` when the queue does not yet hold a complete frame
    /// (nothing is consumed beyond peeks), `Ok(Some(_))` when exactly one
    /// frame was removed from the queue, and `Err` on any validation
    /// failure.  Errors are terminal: the decoder must not be fed further
    /// input afterwards.
    pub fn try_decompress(&mut self, queue: &mut ByteQueue) -> Result<Option<Block>, CodecError> {
        if queue.remaining_bytes() < HEADER_LENGTH {
            // Check the magic bytes that have arrived so far, so a stream
            // that can never become well-formed fails without waiting for a
            // full header.
            let have = queue.remaining_bytes().min(MAGIC_LENGTH);
            for i in 0..have {
                if queue.peek_byte(i) != MAGIC[i] {
                    return Err(CodecError::Corrupted("bad magic bytes"));
                }
            }
            return Ok(None);
        }

        self.read_header(queue)?;

        let compressed_len = self.compressed_len as usize;
        if queue.remaining_bytes() < HEADER_LENGTH + compressed_len {
            return Ok(None);
        }
        queue.skip(HEADER_LENGTH);

        if self.finished {
            return Ok(Some(Block::EndOfStream));
        }

        let body = queue.take_exact(compressed_len);
        let payload = self.decode_body(&body)?;
        Ok(Some(Block::Data(payload)))
    }

    /// Parse and cross-validate the 21-byte header without consuming it.
    fn read_header(&mut self, queue: &ByteQueue) -> Result<(), CodecError> {
        let mut header = [0u8; HEADER_LENGTH];
        queue.peek_into(0, &mut header);

        if header[..MAGIC_LENGTH] != MAGIC {
            return Err(CodecError::Corrupted("bad magic bytes"));
        }

        let token = header[TOKEN_OFFSET];
        let method = CompressionMethod::from_token(token)
            .ok_or(CodecError::Corrupted("unknown compression method"))?;
        let level = COMPRESSION_LEVEL_BASE + u32::from(token & 0x0F);

        // Lengths are signed on the wire; the high bit set means corruption.
        let compressed_len = read_le32(&header, COMPRESSED_LEN_OFFSET) as i32;
        let original_len = read_le32(&header, ORIGINAL_LEN_OFFSET) as i32;
        let check = read_le32(&header, CHECKSUM_OFFSET);

        if original_len < 0 || compressed_len < 0 {
            return Err(CodecError::Corrupted("negative block length"));
        }
        if (original_len as u32) > (1u32 << level) {
            return Err(CodecError::Corrupted("block length exceeds level bound"));
        }
        if (original_len == 0) != (compressed_len == 0) {
            return Err(CodecError::Corrupted("zero-length field mismatch"));
        }
        if method == CompressionMethod::Raw && original_len != compressed_len {
            return Err(CodecError::Corrupted("raw block length mismatch"));
        }
        if original_len == 0 {
            if check != 0 {
                return Err(CodecError::Corrupted(
                    "non-zero checksum on end-of-stream block",
                ));
            }
            self.finished = true;
        }

        self.original_len = original_len;
        self.compressed_len = compressed_len;
        self.method = method;
        self.check = check;
        Ok(())
    }

    /// Decode and verify one frame body against the header just parsed.
    fn decode_body(&mut self, body: &[u8]) -> Result<Vec<u8>, CodecError> {
        let original_len = self.original_len as usize;
        let mut payload = vec![0u8; original_len];
        match self.method {
            CompressionMethod::Raw => payload.copy_from_slice(body),
            CompressionMethod::Lz4 => {
                // `body` is exactly `compressed_len` bytes, and the
                // primitive fails unless it consumes all of them, so a
                // header that overstates the compressed size cannot pass.
                let written = lz4::decompress(body, &mut payload)?;
                if written != original_len {
                    return Err(CodecError::Corrupted("LZ4 payload length mismatch"));
                }
            }
        }

        self.hasher.reset(CHECKSUM_SEED);
        self.hasher.update(&payload);
        if self.hasher.digest() != self.check {
            return Err(CodecError::Corrupted("payload checksum mismatch"));
        }
        Ok(payload)
    }
}
