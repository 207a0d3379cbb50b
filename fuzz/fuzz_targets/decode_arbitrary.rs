#![no_main]
use libfuzzer_sys::fuzz_target;

use lz4block::{BlockDecompressor, ByteQueue};

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through the incremental decoder.
    // Err results are expected and fine; what we verify is no panics.

    // Whole-buffer feeding.
    let mut queue = ByteQueue::new();
    queue.push(data.to_vec());
    let mut dec = BlockDecompressor::new();
    while let Ok(Some(_)) = dec.try_decompress(&mut queue) {}

    // Re-feed in small fragments to exercise the partial-header paths.
    let mut queue = ByteQueue::new();
    let mut dec = BlockDecompressor::new();
    for chunk in data.chunks(3) {
        queue.push(chunk.to_vec());
        loop {
            match dec.try_decompress(&mut queue) {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }
});
