//! Fuzz target for the key decoder.
//!
//! The decoder consumes untrusted terminal bytes; it must never panic and
//! must always make progress, whatever arrives.

#![no_main]

use libfuzzer_sys::fuzz_target;
use termline::KeyDecoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = KeyDecoder::new(-1);

    // Feed in two chunks to exercise partial-sequence buffering.
    let split = data.len() / 2;
    decoder.feed(&data[..split]);
    while decoder.next_key().is_some() {}

    decoder.feed(&data[split..]);
    while decoder.next_key().is_some() {}

    // Forcing must resolve every buffered partial without looping.
    while decoder.force_next_key().is_some() {}
    assert!(!decoder.has_partial());
});
