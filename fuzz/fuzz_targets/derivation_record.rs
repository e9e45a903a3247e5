#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use storegraph_engine::derivation::{RawMetadata, parse_derivation};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    name: Option<String>,
    pname: Option<String>,
    version: Option<String>,
    /// `__json` 구조화 속성 원문
    structured: Option<String>,
    via_output: Option<String>,
}

fuzz_target!(|input: FuzzInput| {
    let mut raw = RawMetadata::new();
    if let Some(name) = input.name {
        raw.insert("name".to_owned(), name);
    }
    if let Some(pname) = input.pname {
        raw.insert("pname".to_owned(), pname);
    }
    if let Some(version) = input.version {
        raw.insert("version".to_owned(), version);
    }
    if let Some(structured) = input.structured {
        raw.insert("__json".to_owned(), structured);
    }

    if let Ok(record) =
        parse_derivation(&raw, "/nix/store/fuzz-input.drv", input.via_output.as_deref())
    {
        assert!(!record.name.is_empty());
        assert!(!record.outputs.contains(&record.store_path));
    }
});
