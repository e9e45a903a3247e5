//! 그래프 엔진 에러 타입
//!
//! [`EngineError`]는 클로저 구성, deriver 해석, 메타데이터 파싱, 순회 및
//! 렌더링 중에 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<EngineError> for StoreGraphError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **치명적**: `ArtifactNotFound`, `ExternalQueryFailed`, `InvalidPattern`, `Config`, `Render`, `Io`
//! - **노드 단위 복구 가능**: `DeriverNotFound`, `MalformedMetadata`
//!
//! 복구 가능한 에러는 클로저 구성 중 해당 노드만 건너뛰고 경고를 남깁니다.
//! 단, 대상(target) 자체의 deriver 를 찾지 못한 경우는 호출자가 치명적으로 처리합니다.

use storegraph_core::error::{ConfigError, GraphError, StoreError, StoreGraphError};

/// 그래프 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 대상 경로가 스토어 객체로 존재하지 않음
    #[error("artifact not found: {path}")]
    ArtifactNotFound {
        /// 조회한 스토어 경로
        path: String,
    },

    /// deriver 를 결정할 수 없음 (두 후보 모두 진단용으로 보관)
    #[error(
        "deriver not found for '{path}' (primary: {}, fallback: {})",
        .primary.as_deref().unwrap_or("-"),
        .fallback.as_deref().unwrap_or("-")
    )]
    DeriverNotFound {
        /// deriver 를 찾으려던 경로
        path: String,
        /// 첫 번째 조회 결과
        primary: Option<String>,
        /// 두 번째(JSON) 조회 결과
        fallback: Option<String>,
    },

    /// derivation 메타데이터 파싱 실패
    #[error("malformed metadata: {path}: {reason}")]
    MalformedMetadata {
        /// 대상 derivation 경로
        path: String,
        /// 실패 사유 (파서 위치 포함)
        reason: String,
    },

    /// 외부 스토어 조회 명령이 실패하거나 잘못된 출력을 반환
    #[error("external query failed: {command}: {reason}")]
    ExternalQueryFailed {
        /// 실행한 명령줄
        command: String,
        /// 종료 상태 / stderr
        reason: String,
    },

    /// 잘못된 정규식 필터
    #[error("invalid pattern for '{field}': {reason}")]
    InvalidPattern {
        /// 필터 이름 (until, inverse, colorize)
        field: String,
        /// 정규식 컴파일 에러
        reason: String,
    },

    /// 엔진 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 렌더링 / 출력 직렬화 실패
    #[error("render error: {0}")]
    Render(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl EngineError {
    /// 노드 단위로 건너뛸 수 있는 에러인지 여부
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DeriverNotFound { .. } | Self::MalformedMetadata { .. }
        )
    }
}

impl From<EngineError> for StoreGraphError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ArtifactNotFound { path } => {
                StoreGraphError::Store(StoreError::TargetNotFound(path))
            }
            e @ EngineError::DeriverNotFound { .. } => {
                StoreGraphError::Store(StoreError::Inconsistent(e.to_string()))
            }
            e @ EngineError::MalformedMetadata { .. } => {
                StoreGraphError::Store(StoreError::Inconsistent(e.to_string()))
            }
            e @ EngineError::ExternalQueryFailed { .. } => {
                StoreGraphError::Store(StoreError::QueryFailed(e.to_string()))
            }
            EngineError::InvalidPattern { field, reason } => {
                StoreGraphError::Graph(GraphError::InvalidPattern { field, reason })
            }
            EngineError::Config { field, reason } => {
                StoreGraphError::Config(ConfigError::InvalidValue { field, reason })
            }
            EngineError::Render(msg) => StoreGraphError::Graph(GraphError::Render(msg)),
            EngineError::Io { source, .. } => StoreGraphError::Io(source),
        }
    }
}
