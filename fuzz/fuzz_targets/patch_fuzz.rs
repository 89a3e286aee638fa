#![no_main]
use bsdelta::delta::{self, Delta, PatchOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Carve old buffer and the three streams out of the input. The
    // applier must never panic, only return errors.
    if data.len() < 4 {
        return;
    }
    let lens: Vec<usize> = data[..3].iter().map(|&b| b as usize).collect();
    let new_size = u64::from(data[3]);
    let mut rest = &data[4..];
    let mut take = |n: usize| {
        let cur: &[u8] = rest;
        let (head, tail) = cur.split_at(n.min(cur.len()));
        rest = tail;
        head.to_vec()
    };
    let control = take(lens[0]);
    let diff = take(lens[1]);
    let extra = take(lens[2]);
    let old = rest.to_vec();

    let d = Delta::from_parts(control, diff, extra, new_size);
    if let Ok(out) = delta::patch(&old, &d) {
        assert_eq!(out.len() as u64, new_size);
    }
    let strict = PatchOptions {
        strict_old_bounds: true,
    };
    let _ = delta::patch_with_options(&old, &d, &strict);
});
