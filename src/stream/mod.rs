//! Streaming drivers that move whole block streams between collaborators.
//!
//! Two flavors share the block codec: channel drivers
//! ([`StreamCompressor`], [`StreamDecompressor`]) for pipelines built from
//! crossbeam channels, and blocking [`Read`](std::io::Read)/
//! [`Write`](std::io::Write) adapters ([`io`]) for plain I/O streams.

pub mod compress;
pub mod decompress;
pub mod io;

pub use compress::StreamCompressor;
pub use decompress::{Inspector, StreamDecompressor};
pub use io::{compress_to_writer, decompress_to_writer};
