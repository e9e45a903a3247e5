//! 스토어 조회 인터페이스 -- 엔진이 환경에서 소비하는 외부 조회 연산
//!
//! [`StoreQuery`] trait은 패키지 스토어 백엔드가 구현해야 하는 인터페이스입니다.
//! 엔진은 스토어를 읽기만 하며 절대 변경하지 않습니다.
//!
//! # 구현체
//!
//! - [`NixStore`]: 패키지 관리자 조회 명령을 하위 프로세스로 실행
//! - [`MemoryStore`]: 메모리 내 스냅샷 (테스트 및 오프라인 분석용)
//!
//! # 에러 정책
//!
//! 외부 조회 실패는 재시도 없이 즉시 [`EngineError::ExternalQueryFailed`]로 반환됩니다.
//! 재시도 정책은 호출자의 책임입니다.

pub mod memory;
pub mod nix;
pub mod resolver;

pub use memory::MemoryStore;
pub use nix::NixStore;
pub use resolver::find_deriver;

use serde::{Deserialize, Serialize};

use crate::derivation::RawMetadata;
use crate::error::EngineError;

/// deriver 조회 결과 -- 서로 독립적인 두 조회 소스의 응답
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeriverCandidates {
    /// 첫 번째 소스의 직접 응답 (`unknown-deriver` 는 `None`)
    pub primary: Option<String>,
    /// 두 번째 소스의 build-description JSON (첫 키가 후보)
    pub fallback_json: Option<String>,
}

/// 실현된 클로저의 구성원과 deriver 힌트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedPath {
    /// 클로저 구성원 경로
    pub path: String,
    /// 알려진 deriver (없을 수 있음)
    pub deriver: Option<String>,
}

impl RealizedPath {
    /// deriver 힌트 없이 생성합니다.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deriver: None,
        }
    }

    /// deriver 힌트와 함께 생성합니다.
    pub fn with_deriver(path: impl Into<String>, deriver: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deriver: Some(deriver.into()),
        }
    }
}

/// 패키지 스토어 조회 trait
///
/// 모든 연산은 유한한 조회이며, 실패 시 에러를 반환합니다.
pub trait StoreQuery {
    /// 스토어 디렉토리 (예: `/nix/store`)
    fn store_dir(&self) -> &str;

    /// 경로가 스토어 객체로 존재하는지 확인합니다.
    fn exists(&self, path: &str) -> Result<bool, EngineError>;

    /// 임의의 참조를 실현된 기본 출력 경로로 변환합니다.
    fn resolve_output_path(&self, path: &str) -> Result<String, EngineError>;

    /// build-description 의 모든 출력 경로를 조회합니다.
    fn query_output_paths(&self, drv_path: &str) -> Result<Vec<String>, EngineError>;

    /// 두 소스로 deriver 후보를 조회합니다.
    fn query_deriver(&self, path: &str) -> Result<DeriverCandidates, EngineError>;

    /// build-description 의 전이적 참조 클로저 (빌드 시점, 순서 무관)
    fn query_reference_closure(&self, drv_path: &str) -> Result<Vec<String>, EngineError>;

    /// 출력 경로의 실현된 전이적 클로저 (실행 시점)
    ///
    /// `force_realise` 가 참이면 필요 시 출력을 실현합니다.
    fn query_realized_closure(
        &self,
        output_path: &str,
        force_realise: bool,
    ) -> Result<Vec<RealizedPath>, EngineError>;

    /// 경로의 직접 참조 목록
    fn query_references(&self, path: &str) -> Result<Vec<String>, EngineError>;

    /// build-description 이 선언한 속성 맵을 읽습니다.
    fn read_metadata(&self, drv_path: &str) -> Result<RawMetadata, EngineError>;
}
