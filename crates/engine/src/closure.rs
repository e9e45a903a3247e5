//! Closure Builder -- 대상 아티팩트의 전이적 의존성 클로저 구성
//!
//! # 흐름
//!
//! ```text
//! target --exists?--> find_deriver --+-- buildtime: reference closure(drv) --> 모든 .drv 로드
//!                                    |
//!                                    +-- runtime:   outputs(drv) --> realized closure(out)
//!                                                   --> 구성원별 deriver 해석 --> 로드
//!
//! 발견된 노드마다 references(node) ∩ 노드 집합 --> Edge 집합
//! ```
//!
//! 노드 단위 에러(`DeriverNotFound`, `MalformedMetadata`)는 경고 후 건너뜁니다.
//! 대상 자체의 에러와 외부 조회 실패는 즉시 반환합니다.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use storegraph_core::metrics as m;

use crate::derivation::{DerivationRecord, parse_derivation};
use crate::error::EngineError;
use crate::store::{RealizedPath, StoreQuery, find_deriver};
use crate::types::{DependencyKind, Edge, StorePath};

/// derivation 레코드 캐시 (프로세스 단위, 스레드 안전하지 않음)
///
/// 레코드는 build-description 경로와 누적된 모든 출력 경로로 색인됩니다.
#[derive(Debug, Default)]
pub struct DerivationCache {
    records: Vec<DerivationRecord>,
    index: HashMap<String, usize>,
}

impl DerivationCache {
    /// 빈 캐시를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 경로(build-description 또는 출력)로 레코드를 조회합니다.
    pub fn get(&self, path: &str) -> Option<&DerivationRecord> {
        self.index.get(path).map(|&i| &self.records[i])
    }

    /// 경로가 색인되어 있는지 여부
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// 레코드 수
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 모든 레코드
    pub fn records(&self) -> &[DerivationRecord] {
        &self.records
    }

    /// build-description 을 로드하고 레코드 위치를 반환합니다.
    ///
    /// - `.drv` 가 아닌 경로는 무시합니다 (`None`).
    /// - `via_output` 이 이미 색인되어 있으면 기존 레코드를 반환합니다.
    /// - 레코드가 이미 있고 `via_output` 이 새 출력이면 그 레코드에 추가합니다 (재귀속).
    pub fn load<S: StoreQuery + ?Sized>(
        &mut self,
        store: &S,
        drv_path: &str,
        via_output: Option<&str>,
    ) -> Result<Option<usize>, EngineError> {
        if !StorePath::new(drv_path).is_derivation() {
            trace!(path = drv_path, "not a derivation, skipping");
            return Ok(None);
        }
        if let Some(out) = via_output
            && let Some(&i) = self.index.get(out)
        {
            return Ok(Some(i));
        }

        let idx = match self.index.get(drv_path) {
            Some(&i) => i,
            None => {
                let raw = store.read_metadata(drv_path)?;
                let record = parse_derivation(&raw, drv_path, via_output)?;
                trace!(record = %record, "loaded derivation");
                let i = self.records.len();
                self.index.insert(drv_path.to_owned(), i);
                for out in &record.outputs {
                    self.index.insert(out.clone(), i);
                }
                self.records.push(record);
                i
            }
        };

        if let Some(out) = via_output
            && self.records[idx].add_output(out)
        {
            debug!(drv = drv_path, output = out, "adding output to existing derivation");
            self.index.insert(out.to_owned(), idx);
        }
        Ok(Some(idx))
    }
}

/// 클로저 구성 결과
#[derive(Debug, Clone, Serialize)]
pub struct Closure {
    /// 포함된 의존성 종류 (병합 시 둘 다)
    pub kinds: BTreeSet<DependencyKind>,
    /// 요청된 대상 경로
    pub target: String,
    /// 대상의 deriver
    pub target_deriver: String,
    /// 순회 시작 경로 (buildtime: deriver, runtime: 기본 출력)
    pub start_path: String,
    /// 중복 없는 derivation 레코드 (정렬됨)
    pub records: Vec<DerivationRecord>,
    /// 의존성 엣지 집합
    pub edges: BTreeSet<Edge>,
}

impl Closure {
    /// 두 클로저를 합칩니다 (런타임 + 빌드타임 결합 뷰).
    ///
    /// 같은 build-description 경로의 레코드는 출력 경로를 합쳐 하나로 유지합니다.
    /// 대상과 시작 경로는 `self` 의 것을 유지합니다.
    pub fn merge(mut self, other: Closure) -> Closure {
        let mut by_path: BTreeMap<String, DerivationRecord> = self
            .records
            .drain(..)
            .map(|r| (r.store_path.clone(), r))
            .collect();
        for record in other.records {
            match by_path.get_mut(&record.store_path) {
                Some(existing) => {
                    for out in &record.outputs {
                        existing.add_output(out);
                    }
                }
                None => {
                    by_path.insert(record.store_path.clone(), record);
                }
            }
        }
        self.records = by_path.into_values().collect();
        self.records.sort();
        self.kinds.extend(other.kinds);
        self.edges.extend(other.edges);
        self
    }

    /// 엣지를 벡터로 복사합니다 (정렬 순서 유지).
    pub fn edge_list(&self) -> Vec<Edge> {
        self.edges.iter().cloned().collect()
    }
}

/// 클로저 구성기
///
/// 캐시는 구성기 수명 동안 유지되어 여러 번의 `build` 호출이 레코드를 공유합니다.
pub struct ClosureBuilder<'s, S: StoreQuery + ?Sized> {
    store: &'s S,
    force_realise: bool,
    cache: DerivationCache,
}

impl<'s, S: StoreQuery + ?Sized> ClosureBuilder<'s, S> {
    /// 새 구성기를 생성합니다.
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            force_realise: true,
            cache: DerivationCache::new(),
        }
    }

    /// 런타임 클로저 조회 시 출력 강제 실현 여부를 설정합니다.
    pub fn force_realise(mut self, force: bool) -> Self {
        self.force_realise = force;
        self
    }

    /// 내부 캐시
    pub fn cache(&self) -> &DerivationCache {
        &self.cache
    }

    /// 대상의 클로저를 구성합니다.
    pub fn build(&mut self, target: &str, kind: DependencyKind) -> Result<Closure, EngineError> {
        if !self.store.exists(target)? {
            return Err(EngineError::ArtifactNotFound {
                path: target.to_owned(),
            });
        }
        info!(target_path = %target, kind = %kind, "loading dependencies");

        let target_deriver = find_deriver(self.store, target)?;
        debug!(target_path = %target, deriver = %target_deriver, "resolved target deriver");

        let (start_path, nodes, touched) = match kind {
            DependencyKind::Buildtime => self.load_buildtime(&target_deriver)?,
            DependencyKind::Runtime => self.load_runtime(&target_deriver)?,
        };

        let edges = self.collect_edges(&nodes)?;
        metrics::counter!(m::CLOSURE_EDGES_TOTAL, m::LABEL_KIND => kind_label(kind))
            .increment(edges.len() as u64);
        if edges.is_empty() {
            info!(kind = %kind, "no dependencies");
        }

        let mut records: Vec<DerivationRecord> = touched
            .into_iter()
            .map(|i| self.cache.records[i].clone())
            .collect();
        records.sort();

        Ok(Closure {
            kinds: BTreeSet::from([kind]),
            target: target.to_owned(),
            target_deriver,
            start_path,
            records,
            edges,
        })
    }

    fn load_buildtime(
        &mut self,
        drv_path: &str,
    ) -> Result<(String, BTreeSet<String>, BTreeSet<usize>), EngineError> {
        let nodes: BTreeSet<String> = self
            .store
            .query_reference_closure(drv_path)?
            .into_iter()
            .collect();

        let mut touched = BTreeSet::new();
        for path in &nodes {
            if !StorePath::new(path).is_derivation() {
                continue;
            }
            if let Some(i) = self.load_node(path, path, None, DependencyKind::Buildtime)? {
                touched.insert(i);
            }
        }
        Ok((drv_path.to_owned(), nodes, touched))
    }

    fn load_runtime(
        &mut self,
        drv_path: &str,
    ) -> Result<(String, BTreeSet<String>, BTreeSet<usize>), EngineError> {
        let start_path = self.store.resolve_output_path(drv_path)?;
        let mut nodes = BTreeSet::new();
        let mut touched = BTreeSet::new();

        for output in self.store.query_output_paths(drv_path)? {
            let members = self
                .store
                .query_realized_closure(&output, self.force_realise)?;
            for member in members {
                if !nodes.insert(member.path.clone()) || self.cache.contains(&member.path) {
                    if let Some(&i) = self.cache.index.get(&member.path) {
                        touched.insert(i);
                    }
                    continue;
                }
                let deriver = match self.member_deriver(&member)? {
                    Ok(d) => d,
                    Err(e) => {
                        skip_node(&member.path, &e, "deriver_not_found");
                        continue;
                    }
                };
                let loaded = self.load_node(
                    &member.path,
                    &deriver,
                    Some(&member.path),
                    DependencyKind::Runtime,
                )?;
                if let Some(i) = loaded {
                    touched.insert(i);
                }
            }
        }
        Ok((start_path, nodes, touched))
    }

    /// 실현된 클로저 구성원의 deriver 를 결정합니다.
    ///
    /// 힌트는 스토어에 실제로 존재할 때만 사용하고, 아니면 두 소스 조회로
    /// 넘어갑니다. 안쪽 `Err` 는 건너뛸 수 있는 노드 단위 실패입니다.
    fn member_deriver(
        &self,
        member: &RealizedPath,
    ) -> Result<Result<String, EngineError>, EngineError> {
        if let Some(hint) = &member.deriver {
            if self.store.exists(hint)? {
                return Ok(Ok(hint.clone()));
            }
            debug!(path = %member.path, hint = %hint, "deriver hint is not in the store");
        }
        match find_deriver(self.store, &member.path) {
            Ok(d) => Ok(Ok(d)),
            Err(e) if e.is_recoverable() => Ok(Err(e)),
            Err(e) => Err(e),
        }
    }

    /// 레코드를 로드하고 복구 가능한 에러는 경고 후 건너뜁니다.
    fn load_node(
        &mut self,
        node: &str,
        drv_path: &str,
        via_output: Option<&str>,
        kind: DependencyKind,
    ) -> Result<Option<usize>, EngineError> {
        let before = self.cache.len();
        match self.cache.load(self.store, drv_path, via_output) {
            Ok(idx) => {
                if self.cache.len() > before {
                    metrics::counter!(
                        m::CLOSURE_DERIVATIONS_LOADED_TOTAL,
                        m::LABEL_KIND => kind_label(kind)
                    )
                    .increment(1);
                }
                Ok(idx)
            }
            Err(e) if e.is_recoverable() => {
                skip_node(node, &e, "malformed_metadata");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// 발견된 노드 사이의 직접 참조로 엣지를 만듭니다 (자기 참조 제외).
    fn collect_edges(&self, nodes: &BTreeSet<String>) -> Result<BTreeSet<Edge>, EngineError> {
        let mut edges = BTreeSet::new();
        for node in nodes {
            for reference in self.store.query_references(node)? {
                if reference != *node && nodes.contains(&reference) {
                    edges.insert(Edge::new(reference, node.clone()));
                }
            }
        }
        debug!(nodes = nodes.len(), edges = edges.len(), "collected dependency edges");
        Ok(edges)
    }
}

fn skip_node(path: &str, error: &EngineError, reason: &'static str) {
    warn!(path, error = %error, "skipping closure node");
    metrics::counter!(m::CLOSURE_NODES_SKIPPED_TOTAL, m::LABEL_REASON => reason).increment(1);
}

fn kind_label(kind: DependencyKind) -> &'static str {
    match kind {
        DependencyKind::Runtime => "runtime",
        DependencyKind::Buildtime => "buildtime",
    }
}
