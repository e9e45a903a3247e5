//! 설정 관리 -- storegraph.toml 파싱 및 런타임 설정
//!
//! [`StoreGraphConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`STOREGRAPH_STORE_STORE_DIR=/nix/store` 형식)
//! 3. 설정 파일 (`storegraph.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), storegraph_core::error::StoreGraphError> {
//! use storegraph_core::config::StoreGraphConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = StoreGraphConfig::load("storegraph.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = StoreGraphConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StoreGraphError};

/// storegraph 통합 설정
///
/// `storegraph.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreGraphConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 패키지 스토어 조회 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 그래프 순회 설정
    #[serde(default)]
    pub graph: GraphConfig,
}

impl StoreGraphConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreGraphError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값으로 시작하여 환경변수 오버라이드를 적용합니다.
    ///
    /// CLI의 기본 설정 경로처럼 "있으면 읽는다" 의미가 필요할 때 사용합니다.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, StoreGraphError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreGraphError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreGraphError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StoreGraphError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, StoreGraphError> {
        toml::from_str(toml_str).map_err(|e| {
            StoreGraphError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `STOREGRAPH_{SECTION}_{FIELD}`
    /// 예: `STOREGRAPH_GRAPH_DEFAULT_DEPTH=3`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STOREGRAPH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "STOREGRAPH_GENERAL_LOG_FORMAT");

        // Store
        override_string(&mut self.store.store_dir, "STOREGRAPH_STORE_STORE_DIR");
        override_string(&mut self.store.nix_store_bin, "STOREGRAPH_STORE_NIX_STORE_BIN");
        override_string(&mut self.store.nix_bin, "STOREGRAPH_STORE_NIX_BIN");
        override_bool(&mut self.store.force_realise, "STOREGRAPH_STORE_FORCE_REALISE");

        // Graph
        override_u32(&mut self.graph.default_depth, "STOREGRAPH_GRAPH_DEFAULT_DEPTH");
        override_usize(
            &mut self.graph.max_iterations,
            "STOREGRAPH_GRAPH_MAX_ITERATIONS",
        );
        override_bool(&mut self.graph.pathnames, "STOREGRAPH_GRAPH_PATHNAMES");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StoreGraphError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // store_dir 는 절대 경로여야 경로 접두사 판별이 가능
        if self.store.store_dir.is_empty() || !self.store.store_dir.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "store.store_dir".to_owned(),
                reason: "must be a non-empty absolute path".to_owned(),
            }
            .into());
        }

        if self.store.nix_store_bin.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.nix_store_bin".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.store.nix_bin.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.nix_bin".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.graph.default_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "graph.default_depth".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.graph.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "graph.max_iterations".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 패키지 스토어 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 스토어 디렉토리 (경로 접두사)
    pub store_dir: String,
    /// `nix-store` 실행 파일
    pub nix_store_bin: String,
    /// `nix` 실행 파일
    pub nix_bin: String,
    /// 런타임 클로저 조회 시 출력 경로를 강제로 실현(realise)할지 여부
    pub force_realise: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_dir: "/nix/store".to_owned(),
            nix_store_bin: "nix-store".to_owned(),
            nix_bin: "nix".to_owned(),
            force_realise: true,
        }
    }
}

/// 그래프 순회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// 기본 순회 깊이
    pub default_depth: u32,
    /// 순회 작업 항목 상한 (깊이가 매우 클 때의 방어선)
    pub max_iterations: usize,
    /// 노드 라벨에 스토어 경로를 함께 표시
    pub pathnames: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_depth: 1,
            max_iterations: 1_000_000,
            pathnames: false,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}
