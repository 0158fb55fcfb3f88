//! Fuzz target: `LineDecoder::push`
//!
//! Drives arbitrary byte sequences into the streaming line decoder and
//! asserts that it never panics, never yields empty or oversized lines,
//! and accepts bytes cleanly again after a reset.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use luxguard::rpc::codec::{LineDecoder, MAX_LINE_SIZE};

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &b in data {
        if let Some(line) = decoder.push(b) {
            assert!(!line.is_empty(), "decoder must not yield empty lines");
            assert!(line.len() <= MAX_LINE_SIZE, "line exceeds MAX_LINE_SIZE");
            assert!(!line.iter().any(|&c| c == b'\n' || c == b'\r'));
        }
    }

    decoder.reset();
    for &b in data {
        let _ = decoder.push(b);
    }
});
