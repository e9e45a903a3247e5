//! 에러 타입 -- 도메인별 에러 정의

/// storegraph 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StoreGraphError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 패키지 스토어 조회 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 그래프 순회/렌더링 에러
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 패키지 스토어 조회 에러
///
/// `TargetNotFound`와 `Inconsistent`는 사용자에게 서로 다른 메시지와
/// 종료 코드로 보고되어야 합니다.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 대상 경로가 스토어에 존재하지 않음
    #[error("target not found in store: {0}")]
    TargetNotFound(String),

    /// 대상은 존재하지만 의존성 데이터가 일관되지 않음 (deriver / 메타데이터)
    #[error("inconsistent dependency data: {0}")]
    Inconsistent(String),

    /// 외부 스토어 조회 명령 실패
    #[error("store query failed: {0}")]
    QueryFailed(String),
}

/// 그래프 순회/렌더링 에러
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// 잘못된 정규식 패턴
    #[error("invalid pattern for '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },

    /// 렌더링 실패
    #[error("render failed: {0}")]
    Render(String),
}
