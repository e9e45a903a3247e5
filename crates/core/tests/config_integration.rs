//! storegraph.toml 통합 설정 테스트
//!
//! - storegraph.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use storegraph_core::config::StoreGraphConfig;
use storegraph_core::error::{ConfigError, StoreGraphError};

const EXAMPLE: &str = include_str!("../../../storegraph.toml.example");

/// 환경변수를 설정한 채로 `f`를 실행하고 원래 값으로 복원합니다.
fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(key, value);
    }

    let result = f();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

// =============================================================================
// storegraph.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = StoreGraphConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.store.store_dir, "/nix/store");
    assert!(config.store.force_realise);
}

#[test]
fn example_config_passes_validation() {
    let config = StoreGraphConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let example = StoreGraphConfig::parse(EXAMPLE).expect("should parse");
    let defaults = StoreGraphConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.general.log_format, defaults.general.log_format);
    assert_eq!(example.store.store_dir, defaults.store.store_dir);
    assert_eq!(example.store.nix_store_bin, defaults.store.nix_store_bin);
    assert_eq!(example.store.nix_bin, defaults.store.nix_bin);
    assert_eq!(example.store.force_realise, defaults.store.force_realise);
    assert_eq!(example.graph.default_depth, defaults.graph.default_depth);
    assert_eq!(example.graph.max_iterations, defaults.graph.max_iterations);
    assert_eq!(example.graph.pathnames, defaults.graph.pathnames);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_store_only() {
    let toml = r#"
[store]
store_dir = "/custom/store"
force_realise = false
"#;
    let config = StoreGraphConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.store.store_dir, "/custom/store");
    assert!(!config.store.force_realise);
    // 지정하지 않은 필드는 기본값
    assert_eq!(config.store.nix_store_bin, "nix-store");
    assert_eq!(config.graph.default_depth, 1);
}

#[test]
fn partial_config_two_sections() {
    let toml = r#"
[general]
log_format = "json"

[graph]
default_depth = 8
pathnames = true
"#;
    let config = StoreGraphConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.graph.default_depth, 8);
    assert!(config.graph.pathnames);
    assert_eq!(config.graph.max_iterations, 1_000_000);
}

#[test]
fn load_from_file_applies_validation() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("storegraph.toml");
    std::fs::write(&path, "[graph]\nmax_iterations = 0\n").expect("should write");

    let err = StoreGraphConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("max_iterations"));
}

#[test]
fn load_missing_file_is_an_error() {
    let err = StoreGraphConfig::load("/nonexistent/storegraph.toml").unwrap_err();
    assert!(matches!(
        err,
        StoreGraphError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[test]
#[serial_test::serial]
fn load_or_default_missing_file_uses_defaults() {
    let config = StoreGraphConfig::load_or_default("/nonexistent/storegraph.toml")
        .expect("missing file should fall back to defaults");
    assert_eq!(config.store.nix_bin, "nix");
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;
    let result = with_env("STOREGRAPH_GENERAL_LOG_LEVEL", "error", || {
        let mut config = StoreGraphConfig::parse(toml).expect("should parse");
        config.apply_env_overrides();
        config.general.log_level
    });
    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_defaults() {
    let result = with_env("STOREGRAPH_STORE_NIX_STORE_BIN", "/run/current-system/sw/bin/nix-store", || {
        let mut config = StoreGraphConfig::default();
        config.apply_env_overrides();
        config.store.nix_store_bin
    });
    assert_eq!(result, "/run/current-system/sw/bin/nix-store");
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let result = with_env("STOREGRAPH_STORE_FORCE_REALISE", "false", || {
        let mut config = StoreGraphConfig::default();
        config.apply_env_overrides();
        config.store.force_realise
    });
    assert!(!result);
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let result = with_env("STOREGRAPH_GRAPH_DEFAULT_DEPTH", "3", || {
        let mut config = StoreGraphConfig::parse("[graph]\ndefault_depth = 7\n").expect("should parse");
        config.apply_env_overrides();
        config.graph.default_depth
    });
    assert_eq!(result, 3);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_number_keeps_toml_value() {
    let result = with_env("STOREGRAPH_GRAPH_MAX_ITERATIONS", "lots", || {
        let mut config =
            StoreGraphConfig::parse("[graph]\nmax_iterations = 500\n").expect("should parse");
        config.apply_env_overrides();
        config.graph.max_iterations
    });
    assert_eq!(result, 500);
}

#[test]
#[serial_test::serial]
fn env_override_is_validated_on_load() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("storegraph.toml");
    std::fs::write(&path, EXAMPLE).expect("should write");

    let result = with_env("STOREGRAPH_STORE_STORE_DIR", "relative/store", || {
        StoreGraphConfig::load(&path)
    });
    let err = result.unwrap_err();
    assert!(err.to_string().contains("store_dir"));
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = StoreGraphConfig::parse("").expect("empty string should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.graph.default_depth, 1);
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 주석만 있는 설정 파일
# [graph]
"#;
    let config = StoreGraphConfig::parse(toml).expect("comments-only should parse");
    config.validate().expect("should validate");
    assert!(!config.graph.pathnames);
}

#[test]
fn malformed_toml_returns_parse_error() {
    let err = StoreGraphConfig::parse("[invalid toml").unwrap_err();
    assert!(matches!(
        err,
        StoreGraphError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[graph]
default_depth = "deep"
"#;
    assert!(matches!(
        StoreGraphConfig::parse(toml).unwrap_err(),
        StoreGraphError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn negative_depth_is_rejected_by_parser() {
    let toml = r#"
[graph]
default_depth = -1
"#;
    assert!(StoreGraphConfig::parse(toml).is_err());
}
