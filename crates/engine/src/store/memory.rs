//! 메모리 내 스토어 -- 테스트 및 오프라인 분석용 [`StoreQuery`] 구현
//!
//! 경로, 직접 참조, derivation 메타데이터, deriver 후보를 메모리에 보관하고
//! 클로저 조회는 참조 관계를 따라 계산합니다.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{DeriverCandidates, RealizedPath, StoreQuery};
use crate::derivation::RawMetadata;
use crate::error::EngineError;
use crate::types::StorePath;

/// 메모리 내 스토어 스냅샷
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    store_dir: String,
    paths: BTreeSet<String>,
    references: BTreeMap<String, BTreeSet<String>>,
    outputs: BTreeMap<String, Vec<String>>,
    metadata: BTreeMap<String, RawMetadata>,
    derivers: BTreeMap<String, DeriverCandidates>,
    realized_hints: BTreeMap<String, String>,
}

impl MemoryStore {
    /// 빈 스토어를 생성합니다.
    pub fn new(store_dir: impl Into<String>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..Self::default()
        }
    }

    /// 스토어 객체를 등록합니다.
    pub fn add_path(&mut self, path: &str) -> &mut Self {
        self.paths.insert(path.to_owned());
        self
    }

    /// derivation 과 출력 경로를 등록합니다.
    ///
    /// 각 출력의 첫 번째 deriver 후보는 이 derivation 으로 설정됩니다.
    pub fn add_derivation(&mut self, drv_path: &str, metadata: RawMetadata, outputs: &[&str]) -> &mut Self {
        self.add_path(drv_path);
        self.metadata.insert(drv_path.to_owned(), metadata);
        self.outputs.insert(
            drv_path.to_owned(),
            outputs.iter().map(|o| (*o).to_owned()).collect(),
        );
        for out in outputs {
            self.add_path(out);
            self.derivers.insert(
                (*out).to_owned(),
                DeriverCandidates {
                    primary: Some(drv_path.to_owned()),
                    fallback_json: None,
                },
            );
        }
        self
    }

    /// `from` 이 `to` 를 직접 참조함을 등록합니다.
    pub fn add_reference(&mut self, from: &str, to: &str) -> &mut Self {
        self.add_path(from);
        self.add_path(to);
        self.references
            .entry(from.to_owned())
            .or_default()
            .insert(to.to_owned());
        self
    }

    /// 경로의 deriver 후보를 덮어씁니다.
    pub fn set_deriver_candidates(&mut self, path: &str, candidates: DeriverCandidates) -> &mut Self {
        self.derivers.insert(path.to_owned(), candidates);
        self
    }

    /// 실현된 클로저 조회 시 반환할 deriver 힌트를 등록합니다.
    pub fn set_realized_hint(&mut self, path: &str, drv_path: &str) -> &mut Self {
        self.realized_hints
            .insert(path.to_owned(), drv_path.to_owned());
        self
    }

    fn require(&self, path: &str, command: &str) -> Result<(), EngineError> {
        if self.paths.contains(path) {
            Ok(())
        } else {
            Err(EngineError::ExternalQueryFailed {
                command: format!("{command} {path}"),
                reason: "path is not valid".to_owned(),
            })
        }
    }

    /// 시작 경로를 포함한 전이적 참조 클로저 (BFS)
    fn closure(&self, start: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([start.to_owned()]);
        while let Some(path) = queue.pop_front() {
            if !seen.insert(path.clone()) {
                continue;
            }
            if let Some(refs) = self.references.get(&path) {
                queue.extend(refs.iter().filter(|r| !seen.contains(*r)).cloned());
            }
        }
        seen.into_iter().collect()
    }
}

impl StoreQuery for MemoryStore {
    fn store_dir(&self) -> &str {
        &self.store_dir
    }

    fn exists(&self, path: &str) -> Result<bool, EngineError> {
        Ok(self.paths.contains(path))
    }

    fn resolve_output_path(&self, path: &str) -> Result<String, EngineError> {
        self.require(path, "resolve-output")?;
        if !StorePath::new(path).is_derivation() {
            return Ok(path.to_owned());
        }
        self.metadata
            .get(path)
            .and_then(|m| m.get("out"))
            .cloned()
            .or_else(|| self.outputs.get(path).and_then(|o| o.first().cloned()))
            .ok_or_else(|| EngineError::ExternalQueryFailed {
                command: format!("resolve-output {path}"),
                reason: "derivation has no 'out' output".to_owned(),
            })
    }

    fn query_output_paths(&self, drv_path: &str) -> Result<Vec<String>, EngineError> {
        self.require(drv_path, "outputs")?;
        Ok(self.outputs.get(drv_path).cloned().unwrap_or_default())
    }

    fn query_deriver(&self, path: &str) -> Result<DeriverCandidates, EngineError> {
        self.require(path, "deriver")?;
        Ok(self.derivers.get(path).cloned().unwrap_or_default())
    }

    fn query_reference_closure(&self, drv_path: &str) -> Result<Vec<String>, EngineError> {
        self.require(drv_path, "requisites")?;
        Ok(self.closure(drv_path))
    }

    fn query_realized_closure(
        &self,
        output_path: &str,
        _force_realise: bool,
    ) -> Result<Vec<RealizedPath>, EngineError> {
        self.require(output_path, "requisites")?;
        Ok(self
            .closure(output_path)
            .into_iter()
            .map(|path| match self.realized_hints.get(&path) {
                Some(deriver) => RealizedPath::with_deriver(path, deriver.as_str()),
                None => RealizedPath::new(path),
            })
            .collect())
    }

    fn query_references(&self, path: &str) -> Result<Vec<String>, EngineError> {
        self.require(path, "references")?;
        Ok(self
            .references
            .get(path)
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn read_metadata(&self, drv_path: &str) -> Result<RawMetadata, EngineError> {
        self.metadata
            .get(drv_path)
            .cloned()
            .ok_or_else(|| EngineError::MalformedMetadata {
                path: drv_path.to_owned(),
                reason: "no metadata recorded".to_owned(),
            })
    }
}
