#![no_main]

use fastlzlib::full::decompress_chunked;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Split the input into odd chunks to exercise the reassembly paths.
    let _ = decompress_chunked(data, 4096, 7, 13);
});
