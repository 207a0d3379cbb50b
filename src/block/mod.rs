//! The framed block codec: wire format, encoder, and decoder.

pub mod compress;
pub mod decompress;
pub mod types;

// Re-export the most important public API items at the module level.
pub use compress::BlockCompressor;
pub use decompress::{Block, BlockDecompressor};
pub use types::{
    CodecError, CompressionMethod, HEADER_LENGTH, MAGIC, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
