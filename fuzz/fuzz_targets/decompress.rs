#![no_main]
use libfuzzer_sys::fuzz_target;
use ovba_decompress::{decompress_with, DecompressOptions, ShortChunkPolicy};

fuzz_target!(|data: &[u8]| {
    let _ = ovba_decompress::decompress(data);
    let opts = DecompressOptions::default()
        .short_final_chunk(ShortChunkPolicy::ZeroPad)
        .parallel_threshold(2);
    let _ = decompress_with(data, &opts);
});
