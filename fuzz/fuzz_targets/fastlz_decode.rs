#![no_main]

use fastlzlib::lz::FastLZDecoder;
use fastlzlib::Decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decompressed = vec![0; 1 << 16];
    {
        let mut decoder = FastLZDecoder::new(data, &mut decompressed);
        let _ = decoder.decode();
    }
});
