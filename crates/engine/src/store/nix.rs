//! 하위 프로세스 기반 스토어 백엔드
//!
//! 패키지 관리자 조회 명령(`nix-store --query ...`, `nix derivation show`)을 실행하고
//! `.drv` 파일은 디스크에서 직접 읽어 [`aterm`](crate::derivation::aterm) 파서로 해석합니다.
//!
//! 0 이 아닌 종료 상태는 명령줄과 stderr 를 담은 [`EngineError::ExternalQueryFailed`] 가 됩니다.

use std::process::Command;
use std::time::Instant;

use tracing::{debug, trace};

use storegraph_core::config::StoreConfig;
use storegraph_core::metrics as m;

use super::{DeriverCandidates, RealizedPath, StoreQuery};
use crate::derivation::RawMetadata;
use crate::derivation::aterm::{self, DerivationFile};
use crate::error::EngineError;

/// deriver 관계가 없을 때 `--deriver` 조회가 출력하는 값
const UNKNOWN_DERIVER: &str = "unknown-deriver";

/// 하위 프로세스 기반 스토어
#[derive(Debug, Clone)]
pub struct NixStore {
    store_dir: String,
    nix_store_bin: String,
    nix_bin: String,
}

impl NixStore {
    /// 기본 실행 파일 이름으로 생성합니다.
    pub fn new(store_dir: impl Into<String>) -> Self {
        Self {
            store_dir: store_dir.into(),
            nix_store_bin: "nix-store".to_owned(),
            nix_bin: "nix".to_owned(),
        }
    }

    /// 코어 설정의 `[store]` 섹션으로 생성합니다.
    pub fn from_core(config: &StoreConfig) -> Self {
        Self {
            store_dir: config.store_dir.clone(),
            nix_store_bin: config.nix_store_bin.clone(),
            nix_bin: config.nix_bin.clone(),
        }
    }

    /// `.drv` 파일을 읽어 파싱합니다.
    pub fn read_derivation(&self, drv_path: &str) -> Result<DerivationFile, EngineError> {
        let content =
            std::fs::read_to_string(drv_path).map_err(|e| EngineError::MalformedMetadata {
                path: drv_path.to_owned(),
                reason: format!("cannot read derivation: {e}"),
            })?;
        aterm::parse(&content).map_err(|e| EngineError::MalformedMetadata {
            path: drv_path.to_owned(),
            reason: e.to_string(),
        })
    }

    fn nix_store_query(&self, query: &'static str, args: &[&str]) -> Result<String, EngineError> {
        let mut full = vec!["--query"];
        full.extend_from_slice(args);
        self.run(query, &self.nix_store_bin, &full)
    }

    fn run(&self, query: &'static str, program: &str, args: &[&str]) -> Result<String, EngineError> {
        let command = format!("{program} {}", args.join(" "));
        trace!(command = %command, "running store query");
        let started = Instant::now();

        let result = Command::new(program).args(args).output();
        metrics::histogram!(m::STORE_QUERY_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                record_query(query, false);
                return Err(EngineError::ExternalQueryFailed {
                    command,
                    reason: format!("failed to spawn: {e}"),
                });
            }
        };

        if !output.status.success() {
            record_query(query, false);
            return Err(EngineError::ExternalQueryFailed {
                command,
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        record_query(query, true);
        String::from_utf8(output.stdout).map_err(|_| EngineError::ExternalQueryFailed {
            command,
            reason: "output is not valid UTF-8".to_owned(),
        })
    }

    /// `nix path-info --json --recursive` 로 클로저 구성원의 deriver 힌트를 얻습니다.
    ///
    /// 힌트는 최선 노력이며 실패하면 빈 목록입니다.
    fn deriver_hints(&self, output_path: &str) -> Vec<(String, String)> {
        let args = [
            "--extra-experimental-features",
            "nix-command",
            "path-info",
            "--json",
            "--recursive",
            output_path,
        ];
        match self.run("path-info", &self.nix_bin, &args) {
            Ok(json) => parse_path_info(&json),
            Err(e) => {
                debug!(path = output_path, error = %e, "deriver hints unavailable");
                Vec::new()
            }
        }
    }
}

impl StoreQuery for NixStore {
    fn store_dir(&self) -> &str {
        &self.store_dir
    }

    fn exists(&self, path: &str) -> Result<bool, EngineError> {
        Ok(std::fs::symlink_metadata(path).is_ok())
    }

    fn resolve_output_path(&self, path: &str) -> Result<String, EngineError> {
        let out = self.nix_store_query("binding", &["--binding", "out", path])?;
        let out = out.trim();
        if out.is_empty() {
            return Err(EngineError::ExternalQueryFailed {
                command: format!("{} --query --binding out {path}", self.nix_store_bin),
                reason: "empty output path".to_owned(),
            });
        }
        Ok(out.to_owned())
    }

    fn query_output_paths(&self, drv_path: &str) -> Result<Vec<String>, EngineError> {
        Ok(lines(&self.nix_store_query("outputs", &["--outputs", drv_path])?))
    }

    fn query_deriver(&self, path: &str) -> Result<DeriverCandidates, EngineError> {
        let primary = self.nix_store_query("deriver", &["--deriver", path])?;
        let primary = primary.trim();
        let primary = (!primary.is_empty() && primary != UNKNOWN_DERIVER).then(|| primary.to_owned());

        let show_args = [
            "--extra-experimental-features",
            "nix-command",
            "derivation",
            "show",
            path,
        ];
        let fallback_json = match self.run("show", &self.nix_bin, &show_args) {
            Ok(json) => Some(json),
            Err(e) => {
                debug!(path, error = %e, "derivation show failed");
                None
            }
        };

        Ok(DeriverCandidates {
            primary,
            fallback_json,
        })
    }

    fn query_reference_closure(&self, drv_path: &str) -> Result<Vec<String>, EngineError> {
        Ok(lines(&self.nix_store_query("requisites", &["--requisites", drv_path])?))
    }

    fn query_realized_closure(
        &self,
        output_path: &str,
        force_realise: bool,
    ) -> Result<Vec<RealizedPath>, EngineError> {
        let mut args = vec!["--requisites"];
        if force_realise {
            args.push("--force-realise");
        }
        args.push(output_path);
        let members = lines(&self.nix_store_query("requisites", &args)?);

        let hints: std::collections::HashMap<String, String> =
            self.deriver_hints(output_path).into_iter().collect();
        Ok(members
            .into_iter()
            .map(|path| match hints.get(&path) {
                Some(deriver) => RealizedPath::with_deriver(path, deriver.as_str()),
                None => RealizedPath::new(path),
            })
            .collect())
    }

    fn query_references(&self, path: &str) -> Result<Vec<String>, EngineError> {
        Ok(lines(&self.nix_store_query("references", &["--references", path])?))
    }

    fn read_metadata(&self, drv_path: &str) -> Result<RawMetadata, EngineError> {
        let started = Instant::now();
        let result = self.read_derivation(drv_path);
        metrics::histogram!(m::STORE_QUERY_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        record_query("metadata", result.is_ok());
        let drv = result?;
        let mut env = drv.env.clone();
        // 구조화 속성 derivation 은 env 에 `out` 이 없을 수 있음
        if !env.contains_key("out") {
            if let Some(out) = drv.output_path("out") {
                env.insert("out".to_owned(), out.to_owned());
            }
        }
        Ok(env)
    }
}

fn record_query(query: &'static str, ok: bool) {
    metrics::counter!(
        m::STORE_QUERIES_TOTAL,
        m::LABEL_QUERY => query,
        m::LABEL_RESULT => if ok { "success" } else { "failure" }
    )
    .increment(1);
}

fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `path-info --json` 출력에서 `(path, deriver)` 쌍을 추출합니다.
///
/// 배열 형식(`[{"path":..,"deriver":..}]`)과 객체 형식(`{"<path>":{"deriver":..}}`)을 모두 지원합니다.
fn parse_path_info(json: &str) -> Vec<(String, String)> {
    use serde_json::Value;

    let Ok(value) = serde_json::from_str::<Value>(json) else {
        return Vec::new();
    };
    let deriver_of = |info: &Value| {
        info.get("deriver")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(str::to_owned)
    };

    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|info| {
                let path = info.get("path")?.as_str()?.to_owned();
                Some((path, deriver_of(info)?))
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(path, info)| Some((path.clone(), deriver_of(info)?)))
            .collect(),
        _ => Vec::new(),
    }
}
