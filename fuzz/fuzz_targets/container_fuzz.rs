#![no_main]
use bsdelta::engine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary patch bytes against an empty and a non-empty old buffer.
    let _ = engine::decode(&[], data);

    if data.len() >= 2 {
        let split = data.len() / 2;
        let (old, patch) = data.split_at(split);
        let _ = engine::decode(old, patch);
    }
});
