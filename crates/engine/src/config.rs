//! 그래프 엔진 설정
//!
//! [`GraphEngineConfig`]는 core 의 `[store]` 와 `[graph]` 섹션을 합쳐
//! 엔진이 필요로 하는 값만 담습니다.
//!
//! # 사용 예시
//!
//! ```
//! use storegraph_engine::{GraphEngineConfig, GraphEngineConfigBuilder};
//!
//! // 기본값으로 생성
//! let config = GraphEngineConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! let config = GraphEngineConfigBuilder::new()
//!     .default_depth(3)
//!     .force_realise(false)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};

use storegraph_core::config::StoreGraphConfig;

use crate::error::EngineError;

/// 순회 작업 항목 상한의 최대값
const MAX_ITERATIONS_LIMIT: usize = 100_000_000;

/// 그래프 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEngineConfig {
    /// 스토어 디렉토리
    pub store_dir: String,
    /// 런타임 클로저 조회 시 출력 강제 실현
    pub force_realise: bool,
    /// 기본 순회 깊이
    pub default_depth: u32,
    /// 순회 작업 항목 상한
    pub max_iterations: usize,
    /// 노드 라벨에 스토어 경로 표시
    pub pathnames: bool,
}

impl Default for GraphEngineConfig {
    fn default() -> Self {
        Self {
            store_dir: "/nix/store".to_owned(),
            force_realise: true,
            default_depth: 1,
            max_iterations: 1_000_000,
            pathnames: false,
        }
    }
}

impl GraphEngineConfig {
    /// core 설정에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &StoreGraphConfig) -> Self {
        Self {
            store_dir: core.store.store_dir.clone(),
            force_realise: core.store.force_realise,
            default_depth: core.graph.default_depth,
            max_iterations: core.graph.max_iterations,
            pathnames: core.graph.pathnames,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `store_dir`: 비어있지 않은 절대 경로
    /// - `default_depth`: 1 이상
    /// - `max_iterations`: 1-100000000
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.store_dir.starts_with('/') {
            return Err(EngineError::Config {
                field: "store_dir".to_owned(),
                reason: "must be a non-empty absolute path".to_owned(),
            });
        }

        if self.default_depth == 0 {
            return Err(EngineError::Config {
                field: "default_depth".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(EngineError::Config {
                field: "max_iterations".to_owned(),
                reason: format!("must be 1-{MAX_ITERATIONS_LIMIT}"),
            });
        }

        Ok(())
    }
}

/// [`GraphEngineConfig`] 빌더
#[derive(Default)]
pub struct GraphEngineConfigBuilder {
    config: GraphEngineConfig,
}

impl GraphEngineConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스토어 디렉토리를 설정합니다.
    pub fn store_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.store_dir = dir.into();
        self
    }

    /// 출력 강제 실현 여부를 설정합니다.
    pub fn force_realise(mut self, force: bool) -> Self {
        self.config.force_realise = force;
        self
    }

    /// 기본 순회 깊이를 설정합니다.
    pub fn default_depth(mut self, depth: u32) -> Self {
        self.config.default_depth = depth;
        self
    }

    /// 순회 작업 항목 상한을 설정합니다.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// 노드 라벨 경로 표시 여부를 설정합니다.
    pub fn pathnames(mut self, pathnames: bool) -> Self {
        self.config.pathnames = pathnames;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `EngineError::Config` 반환
    pub fn build(self) -> Result<GraphEngineConfig, EngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GraphEngineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = StoreGraphConfig::default();
        core.store.store_dir = "/opt/store".to_owned();
        core.store.force_realise = false;
        core.graph.default_depth = 5;
        core.graph.pathnames = true;

        let config = GraphEngineConfig::from_core(&core);
        assert_eq!(config.store_dir, "/opt/store");
        assert!(!config.force_realise);
        assert_eq!(config.default_depth, 5);
        assert!(config.pathnames);
        assert_eq!(config.max_iterations, 1_000_000);
    }

    #[test]
    fn builder_rejects_zero_depth() {
        let err = GraphEngineConfigBuilder::new()
            .default_depth(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("default_depth"));
    }

    #[test]
    fn builder_rejects_relative_store_dir() {
        let err = GraphEngineConfigBuilder::new()
            .store_dir("store")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("store_dir"));
    }

    #[test]
    fn builder_rejects_iteration_cap_out_of_range() {
        assert!(
            GraphEngineConfigBuilder::new()
                .max_iterations(0)
                .build()
                .is_err()
        );
        assert!(
            GraphEngineConfigBuilder::new()
                .max_iterations(MAX_ITERATIONS_LIMIT + 1)
                .build()
                .is_err()
        );
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = GraphEngineConfigBuilder::new()
            .store_dir("/nix/store")
            .force_realise(false)
            .default_depth(2)
            .max_iterations(10)
            .pathnames(true)
            .build()
            .unwrap();
        assert_eq!(config.default_depth, 2);
        assert_eq!(config.max_iterations, 10);
        assert!(config.pathnames);
        assert!(!config.force_realise);
    }
}
