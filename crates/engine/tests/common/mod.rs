//! 통합 테스트 공용 스토어 픽스처

#![allow(dead_code)]

use storegraph_engine::MemoryStore;
use storegraph_engine::derivation::RawMetadata;

pub const HELLO_DRV: &str = "/nix/store/h0000000000000000000000000000000-hello-2.12.drv";
pub const HELLO_OUT: &str = "/nix/store/h1111111111111111111111111111111-hello-2.12";
pub const LIBC_DRV: &str = "/nix/store/l0000000000000000000000000000000-libc-2.31.drv";
pub const LIBC_OUT: &str = "/nix/store/l1111111111111111111111111111111-libc-2.31";
pub const GCC_DRV: &str = "/nix/store/g0000000000000000000000000000000-gcc-11.drv";
pub const GCC_OUT: &str = "/nix/store/g1111111111111111111111111111111-gcc-11";

pub fn meta(pname: &str, version: &str, out: &str) -> RawMetadata {
    RawMetadata::from([
        ("name".to_owned(), format!("{pname}-{version}")),
        ("pname".to_owned(), pname.to_owned()),
        ("version".to_owned(), version.to_owned()),
        ("out".to_owned(), out.to_owned()),
        ("system".to_owned(), "x86_64-linux".to_owned()),
    ])
}

/// hello 2.12 는 실행 시 libc 2.31 을, 빌드 시 gcc 11 과 libc 2.31 을 사용합니다.
pub fn hello_store() -> MemoryStore {
    let mut store = MemoryStore::new("/nix/store");
    store
        .add_derivation(HELLO_DRV, meta("hello", "2.12", HELLO_OUT), &[HELLO_OUT])
        .add_derivation(LIBC_DRV, meta("libc", "2.31", LIBC_OUT), &[LIBC_OUT])
        .add_derivation(GCC_DRV, meta("gcc", "11", GCC_OUT), &[GCC_OUT])
        .add_reference(HELLO_OUT, LIBC_OUT)
        .add_reference(HELLO_DRV, GCC_DRV)
        .add_reference(HELLO_DRV, LIBC_DRV);
    store
}

/// 단순 이름 기반 경로 (`/nix/store/<name 첫 글자>-<name>`)
pub fn path(name: &str) -> String {
    format!("/nix/store/{}-{name}", &name[..1])
}
