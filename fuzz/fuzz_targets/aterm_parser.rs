#![no_main]

use libfuzzer_sys::fuzz_target;
use storegraph_engine::derivation::aterm;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = aterm::parse(input);
    }
});
