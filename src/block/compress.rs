//! Block encoder: one framed block per payload, plus the end-of-stream
//! frame.
//!
//! The encoder never splits or merges payloads.  Each call to
//! [`BlockCompressor::compress`] emits exactly one frame into a freshly
//! allocated buffer; the caller hands it downstream and the downstream
//! releases it.  When LZ4 cannot shrink a payload the frame falls back to
//! the RAW method, so a frame is never larger than `HEADER_LENGTH +
//! payload.len()`.

use crate::lz4::{self, CompressionMode};
use crate::xxhash::{Xxh32State, CHECKSUM_SEED};

use super::types::{
    compression_level_code, write_le32, CompressionMethod, CHECKSUM_OFFSET, COMPRESSED_LEN_OFFSET,
    HEADER_LENGTH, MAGIC, MAGIC_LENGTH, MIN_BLOCK_SIZE, ORIGINAL_LEN_OFFSET, TOKEN_OFFSET,
};

/// Encodes payloads into framed blocks.
///
/// Construct with [`fast`](BlockCompressor::fast),
/// [`high`](BlockCompressor::high),
/// [`high_with_level`](BlockCompressor::high_with_level), or
/// [`store`](BlockCompressor::store).  The encoder owns a streaming XXH32
/// hasher that is reset before each frame.
pub struct BlockCompressor {
    mode: CompressionMode,
    custom_end_of_stream: bool,
    hasher: Xxh32State,
}

impl BlockCompressor {
    /// Encoder backed by the LZ4 fast compressor.
    pub fn fast() -> Self {
        Self::new(CompressionMode::Fast)
    }

    /// Encoder backed by the LZ4 HC compressor at the default level.
    pub fn high() -> Self {
        Self::new(CompressionMode::High(lz4::HC_LEVEL_DEFAULT))
    }

    /// Encoder backed by the LZ4 HC compressor at `level`.
    ///
    /// # Panics
    ///
    /// When `level` lies outside
    /// [`HC_LEVEL_MIN`](lz4::HC_LEVEL_MIN)`..=`[`HC_LEVEL_MAX`](lz4::HC_LEVEL_MAX).
    pub fn high_with_level(level: i32) -> Self {
        Self::new(CompressionMode::High(level))
    }

    /// Encoder that frames every payload verbatim (no compressor).
    pub fn store() -> Self {
        Self::new(CompressionMode::None)
    }

    /// Encoder for an explicit [`CompressionMode`].
    ///
    /// # Panics
    ///
    /// When an HC level lies outside the accepted range.
    pub fn new(mode: CompressionMode) -> Self {
        if let CompressionMode::High(level) = mode {
            assert!(
                (lz4::HC_LEVEL_MIN..=lz4::HC_LEVEL_MAX).contains(&level),
                "HC level {level} outside [{}, {}]",
                lz4::HC_LEVEL_MIN,
                lz4::HC_LEVEL_MAX
            );
        }
        BlockCompressor {
            mode,
            custom_end_of_stream: false,
            hasher: Xxh32State::new(CHECKSUM_SEED),
        }
    }

    /// When set, [`end_of_stream`](BlockCompressor::end_of_stream) encodes
    /// an empty payload through the regular path instead of writing the
    /// fixed 21-byte constant.  The output is bit-identical either way.
    pub fn with_custom_end_of_stream(mut self, custom: bool) -> Self {
        self.custom_end_of_stream = custom;
        self
    }

    /// The compressor backing this encoder.
    pub fn mode(&self) -> CompressionMode {
        self.mode
    }

    /// Encode one payload into one frame.
    ///
    /// The frame is `HEADER_LENGTH + compressed_len` bytes in a fresh
    /// buffer.  LZ4 output is kept only when it is strictly smaller than the
    /// payload; otherwise the payload is framed verbatim with the RAW
    /// method.
    pub fn compress(&mut self, payload: &[u8]) -> Vec<u8> {
        let len = payload.len();
        let block_size = len.max(MIN_BLOCK_SIZE);
        let level_code = compression_level_code(block_size);

        let bound = match self.mode {
            CompressionMode::None => len,
            _ => lz4::max_compressed_len(len),
        };
        let mut frame = vec![0u8; HEADER_LENGTH + bound];

        // An empty block doubles as the end-of-stream marker; its checksum
        // field is zero by definition.
        let check = if payload.is_empty() {
            0
        } else {
            self.checksum(payload)
        };

        let attempt = match self.mode {
            CompressionMode::None => None,
            CompressionMode::Fast => lz4::compress_fast(payload, &mut frame[HEADER_LENGTH..]),
            CompressionMode::High(level) => {
                lz4::compress_high(payload, &mut frame[HEADER_LENGTH..], level)
            }
        };

        let (method, compressed_len) = match attempt {
            Some(n) if n < len => (CompressionMethod::Lz4, n),
            // No compressor, or LZ4 would not shrink the payload.
            _ => {
                frame[HEADER_LENGTH..HEADER_LENGTH + len].copy_from_slice(payload);
                (CompressionMethod::Raw, len)
            }
        };

        frame[..MAGIC_LENGTH].copy_from_slice(&MAGIC);
        frame[TOKEN_OFFSET] = method.token_bits() | level_code;
        write_le32(&mut frame, COMPRESSED_LEN_OFFSET, compressed_len as u32);
        write_le32(&mut frame, ORIGINAL_LEN_OFFSET, len as u32);
        write_le32(&mut frame, CHECKSUM_OFFSET, check);
        frame.truncate(HEADER_LENGTH + compressed_len);
        frame
    }

    /// The 21-byte end-of-stream frame.
    ///
    /// Emitted exactly once, after the last data frame of a stream.
    pub fn end_of_stream(&mut self) -> Vec<u8> {
        if self.custom_end_of_stream {
            return self.compress(&[]);
        }
        let mut frame = vec![0u8; HEADER_LENGTH];
        frame[..MAGIC_LENGTH].copy_from_slice(&MAGIC);
        frame[TOKEN_OFFSET] = CompressionMethod::Raw.token_bits();
        // compressed_len, original_len, and checksum stay zero.
        frame
    }

    fn checksum(&mut self, payload: &[u8]) -> u32 {
        self.hasher.reset(CHECKSUM_SEED);
        self.hasher.update(payload);
        self.hasher.digest()
    }
}
