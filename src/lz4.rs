//! Thin facades over the `lzzzz` LZ4 binding.
//!
//! The block codec needs exactly four primitives: a worst-case output bound,
//! the fast compressor, the HC compressor, and the safe decompressor with a
//! known output length.  Everything about the frame layout lives in
//! [`crate::block`]; this module knows nothing about framing.

use crate::block::types::CodecError;

// ---------------------------------------------------------------------------
// HC level range
// ---------------------------------------------------------------------------

/// Lowest accepted HC compression level.
pub const HC_LEVEL_MIN: i32 = 9;

/// Highest accepted HC compression level.
pub const HC_LEVEL_MAX: i32 = 17;

/// HC level used when none is given.
pub const HC_LEVEL_DEFAULT: i32 = 9;

// ---------------------------------------------------------------------------
// Compressor selection
// ---------------------------------------------------------------------------

/// Which LZ4 compressor backs a
/// [`BlockCompressor`](crate::block::compress::BlockCompressor).
///
/// The choice affects ratio and CPU only; the wire format is identical for
/// all three, and any decoder reads the output of any mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    /// No compressor: every payload is framed verbatim (RAW method).
    /// Useful for measuring framing overhead and in tests.
    None,
    /// LZ4 fast compressor at default acceleration.
    #[default]
    Fast,
    /// LZ4 HC compressor.  The level must lie in
    /// [`HC_LEVEL_MIN`]`..=`[`HC_LEVEL_MAX`].
    High(i32),
}

// ---------------------------------------------------------------------------
// Primitive adapters
// ---------------------------------------------------------------------------

/// Worst-case compressed length for `src_len` input bytes.
#[inline]
pub fn max_compressed_len(src_len: usize) -> usize {
    lzzzz::lz4::max_compressed_size(src_len)
}

/// Compress `src` into `dst` with the fast compressor.
///
/// Returns the compressed length, or `None` when compression fails (the
/// encoder then falls back to RAW framing).
pub fn compress_fast(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    lzzzz::lz4::compress(src, dst, lzzzz::lz4::ACC_LEVEL_DEFAULT).ok()
}

/// Compress `src` into `dst` with the HC compressor at `level`.
///
/// Returns the compressed length, or `None` when compression fails.
pub fn compress_high(src: &[u8], dst: &mut [u8], level: i32) -> Option<usize> {
    lzzzz::lz4_hc::compress(src, dst, level).ok()
}

/// Decompress `src` into `dst`, which must be sized to the exact
/// uncompressed length.
///
/// The binding reports bytes written to `dst`, never bytes consumed from
/// `src`.  Exact input consumption is part of the primitive's contract
/// instead: the strict entry point fails unless the entire `src` slice
/// decodes as one well-formed LZ4 block, so input padded past the true
/// compressed size is rejected the same as malformed sequences.
pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    lzzzz::lz4::decompress(src, dst).map_err(|_| {
        CodecError::Corrupted("LZ4 payload malformed or compressed length mismatch")
    })
}
