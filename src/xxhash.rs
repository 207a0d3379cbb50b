//! Thin wrapper around the `xxhash-rust` crate providing the XXH32 API used
//! by the block codec.
//!
//! Every data frame carries an XXH32 checksum of its uncompressed payload,
//! computed with the fixed seed [`CHECKSUM_SEED`] shared by all writers and
//! readers of the block stream format.

pub use xxhash_rust::xxh32::Xxh32 as Xxh32State;

/// Checksum seed used by every frame in a block stream (the seed of
/// lz4-java's `LZ4BlockOutputStream`).
pub const CHECKSUM_SEED: u32 = 0x9747_B28C;

/// One-shot XXH32 over `data` with the stream seed.
#[inline]
pub fn checksum(data: &[u8]) -> u32 {
    xxhash_rust::xxh32::xxh32(data, CHECKSUM_SEED)
}
