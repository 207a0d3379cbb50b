#![no_main]
use libfuzzer_sys::fuzz_target;

use lz4block::{compress_to_writer, decompress_to_writer, BlockCompressor, BlockDecompressor};

fuzz_target!(|data: &[u8]| {
    // Any input must survive encode → decode bit-exactly, in every mode.
    for mut enc in [
        BlockCompressor::store(),
        BlockCompressor::fast(),
        BlockCompressor::high(),
    ] {
        let mut compressed = Vec::new();
        compress_to_writer(&mut &data[..], &mut compressed, &mut enc).unwrap();

        let mut output = Vec::new();
        decompress_to_writer(&mut &compressed[..], &mut output, &mut BlockDecompressor::new())
            .unwrap();
        assert_eq!(output, data);
    }
});
