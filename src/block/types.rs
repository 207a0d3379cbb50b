//! Wire-format constants, the token byte, and the codec error type.
//!
//! A block stream is a sequence of self-describing frames, each exactly
//! `21 + compressed_len` bytes:
//!
//! | field            | bytes | encoding                                  |
//! |------------------|-------|-------------------------------------------|
//! | magic            | 8     | ASCII `"LZ4Block"`                        |
//! | token            | 1     | method (high nibble) \| level code (low)  |
//! | compressed_len   | 4     | little-endian                             |
//! | original_len     | 4     | little-endian                             |
//! | checksum         | 4     | little-endian, XXH32 of the payload       |
//! | payload          | var   | raw bytes or an LZ4 block, per method     |
//!
//! The stream is terminated by a sentinel frame whose lengths and checksum
//! are all zero.  The layout matches lz4-java's `LZ4BlockOutputStream`, so
//! streams produced here are readable by any `LZ4Block` consumer and vice
//! versa.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Frame layout
// ---------------------------------------------------------------------------

/// Number of magic bytes at the start of every frame.
pub const MAGIC_LENGTH: usize = 8;

/// The frame magic: `L Z 4 B l o c k`.
pub const MAGIC: [u8; MAGIC_LENGTH] = *b"LZ4Block";

/// Full header: magic + token + compressed_len + original_len + checksum.
pub const HEADER_LENGTH: usize = MAGIC_LENGTH + 1 + 4 + 4 + 4;

pub const TOKEN_OFFSET: usize = MAGIC_LENGTH;
pub const COMPRESSED_LEN_OFFSET: usize = MAGIC_LENGTH + 1;
pub const ORIGINAL_LEN_OFFSET: usize = MAGIC_LENGTH + 5;
pub const CHECKSUM_OFFSET: usize = MAGIC_LENGTH + 9;

// ---------------------------------------------------------------------------
// Level codes
// ---------------------------------------------------------------------------

/// A token's level code stores `ceil(log2(block_size)) - COMPRESSION_LEVEL_BASE`,
/// clamped at zero.  Decoders only use it to bound `original_len`.
pub const COMPRESSION_LEVEL_BASE: u32 = 10;

/// Smallest block size used when deriving a level code.
pub const MIN_BLOCK_SIZE: usize = 64;

/// Largest representable block size (level code 0x0F → 32 MiB).
pub const MAX_BLOCK_SIZE: usize = 1 << (COMPRESSION_LEVEL_BASE + 0x0F);

/// Level code for a block of `block_size` bytes.
///
/// `ceil(log2)` is computed as `bit_width(block_size - 1)`, then rebased so
/// that sizes up to 1024 encode as code 0.
pub fn compression_level_code(block_size: usize) -> u8 {
    debug_assert!(
        (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size),
        "block size {block_size} outside [{MIN_BLOCK_SIZE}, {MAX_BLOCK_SIZE}]"
    );
    let level = usize::BITS - (block_size - 1).leading_zeros();
    debug_assert!(1usize << level >= block_size);
    debug_assert!(block_size * 2 > 1 << level);
    let code = level.saturating_sub(COMPRESSION_LEVEL_BASE);
    debug_assert!(code <= 0x0F);
    code as u8
}

// ---------------------------------------------------------------------------
// Token byte
// ---------------------------------------------------------------------------

const METHOD_RAW: u8 = 0x10;
const METHOD_LZ4: u8 = 0x20;

/// How a frame's payload is stored, taken from the token's high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Payload stored verbatim (`compressed_len == original_len`).
    Raw,
    /// Payload is one LZ4 block.
    Lz4,
}

impl CompressionMethod {
    /// Decode the high nibble of a token.  Returns `None` for any method
    /// this format does not define.
    #[inline]
    pub fn from_token(token: u8) -> Option<Self> {
        match token & 0xF0 {
            METHOD_RAW => Some(CompressionMethod::Raw),
            METHOD_LZ4 => Some(CompressionMethod::Lz4),
            _ => None,
        }
    }

    /// The method's high-nibble bit pattern, ready to OR with a level code.
    #[inline]
    pub fn token_bits(self) -> u8 {
        match self {
            CompressionMethod::Raw => METHOD_RAW,
            CompressionMethod::Lz4 => METHOD_LZ4,
        }
    }
}

// ---------------------------------------------------------------------------
// Byte-order helpers
// ---------------------------------------------------------------------------

/// Read a little-endian `u32` from `src` at byte `offset`.
#[inline]
pub fn read_le32(src: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        src[offset],
        src[offset + 1],
        src[offset + 2],
        src[offset + 3],
    ])
}

/// Write a little-endian `u32` into `dst` at byte `offset`.
#[inline]
pub fn write_le32(dst: &mut [u8], offset: usize, value: u32) {
    dst[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced by the block codec and its streaming drivers.
///
/// All errors are terminal: once a decoder or driver reports one, the stream
/// is unusable, both sides are closed with the cause, and nothing is
/// retried.
#[derive(Debug)]
pub enum CodecError {
    /// A malformed frame: failed header validation, checksum mismatch, LZ4
    /// decode failure, or end-of-input before the sentinel frame.  The
    /// payload names the check that failed.
    Corrupted(&'static str),
    /// Bytes were present, or arrived, after the end-of-stream frame.
    UnexpectedTrailingData,
    /// The upstream collaborator failed while supplying input.
    Upstream(io::Error),
    /// The downstream collaborator failed while accepting output.
    Downstream(io::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Corrupted(reason) => write!(f, "corrupted block stream: {reason}"),
            CodecError::UnexpectedTrailingData => {
                f.write_str("unexpected data after end-of-stream block")
            }
            CodecError::Upstream(e) => write!(f, "upstream error: {e}"),
            CodecError::Downstream(e) => write!(f, "downstream error: {e}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Upstream(e) | CodecError::Downstream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> io::Error {
        match err {
            CodecError::Upstream(e) | CodecError::Downstream(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_field_offsets() {
        assert_eq!(HEADER_LENGTH, 21);
        assert_eq!(TOKEN_OFFSET, 8);
        assert_eq!(COMPRESSED_LEN_OFFSET, 9);
        assert_eq!(ORIGINAL_LEN_OFFSET, 13);
        assert_eq!(CHECKSUM_OFFSET, 17);
    }

    #[test]
    fn magic_bytes() {
        assert_eq!(MAGIC, [0x4C, 0x5A, 0x34, 0x42, 0x6C, 0x6F, 0x63, 0x6B]);
    }

    #[test]
    fn token_roundtrip() {
        for method in [CompressionMethod::Raw, CompressionMethod::Lz4] {
            for code in 0u8..=0x0F {
                let token = method.token_bits() | code;
                assert_eq!(CompressionMethod::from_token(token), Some(method));
                assert_eq!(token & 0x0F, code);
            }
        }
    }

    #[test]
    fn unknown_methods_rejected() {
        for high in [0x00u8, 0x30, 0x40, 0x80, 0xF0] {
            assert_eq!(CompressionMethod::from_token(high), None);
            assert_eq!(CompressionMethod::from_token(high | 0x05), None);
        }
    }

    #[test]
    fn level_codes() {
        // Sizes up to 1024 collapse to code 0.
        assert_eq!(compression_level_code(64), 0);
        assert_eq!(compression_level_code(100), 0);
        assert_eq!(compression_level_code(1024), 0);
        // Powers of two land exactly; one past doubles.
        assert_eq!(compression_level_code(1025), 1);
        assert_eq!(compression_level_code(2048), 1);
        assert_eq!(compression_level_code(2049), 2);
        assert_eq!(compression_level_code(65_536), 6);
        assert_eq!(compression_level_code(MAX_BLOCK_SIZE), 0x0F);
    }

    #[test]
    fn level_code_bounds_block_size() {
        // The decoder-side bound: block_size never exceeds 1 << (base + code).
        for block_size in [64usize, 65, 1024, 1025, 4096, 100_000, MAX_BLOCK_SIZE] {
            let code = compression_level_code(block_size);
            assert!(block_size <= 1 << (COMPRESSION_LEVEL_BASE + u32::from(code)));
        }
    }

    #[test]
    fn le32_roundtrip() {
        let mut buf = [0u8; 8];
        write_le32(&mut buf, 2, 0xDEAD_BEEF);
        assert_eq!(read_le32(&buf, 2), 0xDEAD_BEEF);
        // Little-endian byte layout, surrounding bytes untouched.
        assert_eq!(buf, [0, 0, 0xEF, 0xBE, 0xAD, 0xDE, 0, 0]);
    }

    #[test]
    fn error_display_names_the_failure() {
        let e = CodecError::Corrupted("bad magic");
        assert!(e.to_string().contains("bad magic"));
        assert!(CodecError::UnexpectedTrailingData
            .to_string()
            .contains("end-of-stream"));
    }

    #[test]
    fn error_converts_to_io_error() {
        let e: io::Error = CodecError::UnexpectedTrailingData.into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);

        let inner = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let e: io::Error = CodecError::Downstream(inner).into();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
    }
}
