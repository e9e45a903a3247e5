//! storegraph 공통 크레이트
//!
//! 모든 구성 요소가 공유하는 에러 타입, 설정, 메트릭 이름을 정의합니다.
//!
//! - [`error`]: 최상위 에러 (`StoreGraphError`)와 도메인별 하위 에러
//! - [`config`]: `storegraph.toml` 설정 (`StoreGraphConfig`)
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, GraphError, StoreError, StoreGraphError};

// 설정
pub use config::{GeneralConfig, GraphConfig, StoreConfig, StoreGraphConfig};
