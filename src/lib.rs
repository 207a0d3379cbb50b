// lz4block — streaming codec for the LZ4 block stream format.
//
// A block stream is a sequence of self-describing frames ("LZ4Block" magic,
// token, little-endian lengths, XXH32 checksum, payload) terminated by an
// all-zero sentinel frame — the format written by lz4-java's
// `LZ4BlockOutputStream` and spoken by the many systems built on it.

pub mod block;
pub mod lz4;
pub mod queue;
pub mod stream;
pub mod xxhash;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// Frame encoder: one framed block per payload, plus the sentinel.
pub use block::compress::BlockCompressor;

/// Incremental frame decoder over a byte queue.
pub use block::decompress::{Block, BlockDecompressor};

/// Crate-wide error type; all errors are terminal for their stream.
pub use block::types::CodecError;

/// Wire-format essentials.
pub use block::types::{CompressionMethod, HEADER_LENGTH, MAGIC};

/// Compressor selection: none (RAW only), fast, or HC with a level.
pub use lz4::CompressionMode;

/// FIFO of byte buffers feeding the decoder.
pub use queue::ByteQueue;

/// Channel-based drivers for pipeline use.
pub use stream::compress::StreamCompressor;
pub use stream::decompress::{Inspector, StreamDecompressor};

/// Blocking `Read`/`Write` adapters.
pub use stream::io::{compress_to_writer, decompress_to_writer};
