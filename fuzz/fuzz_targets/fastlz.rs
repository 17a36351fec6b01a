#![no_main]

use fastlzlib::lz::{FastLZDecoder, FastLZEncoder};
use fastlzlib::{Context, Decoder, Encoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for level in [1, 9] {
        let mut compressed = vec![0; data.len() * 2 + 64];
        let ctx = Context::new(level, 1 << 16);
        let written = {
            let mut encoder = FastLZEncoder::new(data, &mut compressed, ctx);
            encoder.encode().unwrap()
        };

        let mut decompressed = vec![0; data.len()];
        {
            let payload = &compressed[..written];
            let mut decoder = FastLZDecoder::new(payload, &mut decompressed);
            let (consumed, out) = decoder.decode().unwrap();
            assert_eq!(consumed, written);
            assert_eq!(out, data.len());
        }
        assert_eq!(decompressed, data);
    }
});
