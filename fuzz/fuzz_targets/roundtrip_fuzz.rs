#![no_main]
use bsdelta::{delta, format};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the split between old and new.
    let rest = &data[1..];
    let (old, new) = rest.split_at(data[0] as usize * rest.len() / 255);

    let d = delta::diff(old, new).unwrap();
    assert_eq!(delta::patch(old, &d).unwrap(), new);

    let bytes = format::serialize(&d).unwrap();
    let parsed = format::deserialize(&bytes).unwrap();
    assert_eq!(parsed, d);
});
