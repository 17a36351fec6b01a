//! Lempel–Ziv block transforms.

pub mod fastlz;

pub use fastlz::{FastLZDecoder, FastLZEncoder};
