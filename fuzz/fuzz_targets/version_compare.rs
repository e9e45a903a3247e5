#![no_main]

use std::cmp::Ordering;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use storegraph_engine::compare_versions;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    a: String,
    b: String,
}

fuzz_target!(|input: FuzzInput| {
    let ab = compare_versions(&input.a, &input.b);
    let ba = compare_versions(&input.b, &input.a);
    // 비교는 반대칭이어야 함
    assert_eq!(ab, ba.reverse());
    assert_eq!(compare_versions(&input.a, &input.a), Ordering::Equal);
});
