#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let args: Vec<String> = String::from_utf8_lossy(data)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    bsdelta::cli::fuzz_try_parse_args(&args);
});
