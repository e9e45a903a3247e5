//! 구성요소 목록 -- 클로저, 깊이 제한 순회, 의존성 귀속의 조합
//!
//! ```text
//! ClosureBuilder::build --> (depth 지정 시) 표 모드 순회로 엣지 제한
//!                       --> 엣지 경로를 소유한 레코드 = 구성요소
//!                       --> attribute_dependencies
//! ```
//!
//! 엣지가 하나도 없으면 대상 deriver 레코드만 구성요소로 남습니다.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::attribution::{DependencyMap, attribute_dependencies};
use crate::closure::{Closure, ClosureBuilder};
use crate::derivation::{DerivationRecord, Identity};
use crate::error::EngineError;
use crate::graph::{DependencyGraph, OutputKind, Traversal, TraversalOptions};
use crate::store::StoreQuery;
use crate::types::{DependencyKind, Edge};

/// 중복 없는 구성요소 목록과 구성요소별 의존성 맵
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInventory {
    /// 요청된 대상 경로
    pub target: String,
    /// 대상의 deriver
    pub target_deriver: String,
    /// 포함된 의존성 종류
    pub kinds: BTreeSet<DependencyKind>,
    /// 구성요소 (이름, build-description 경로 순 정렬)
    pub components: Vec<DerivationRecord>,
    /// 의존성 엣지 (정렬됨)
    pub edges: Vec<Edge>,
    /// 구성요소별 직접 의존성 식별자
    pub dependencies: DependencyMap,
}

impl ComponentInventory {
    /// 한 가지 의존성 종류로 목록을 구성합니다.
    pub fn build<S: StoreQuery + ?Sized>(
        store: &S,
        target: &str,
        kind: DependencyKind,
        depth: Option<u32>,
        force_realise: bool,
    ) -> Result<Self, EngineError> {
        let mut builder = ClosureBuilder::new(store).force_realise(force_realise);
        let closure = builder.build(target, kind)?;
        Ok(Self::from_closure(&closure, depth))
    }

    /// 런타임과 빌드타임을 합친 목록을 구성합니다.
    ///
    /// 두 클로저는 같은 캐시를 공유하고, 깊이 제한은 각 클로저의 시작 경로에서 따로 적용됩니다.
    pub fn build_combined<S: StoreQuery + ?Sized>(
        store: &S,
        target: &str,
        depth: Option<u32>,
        force_realise: bool,
    ) -> Result<Self, EngineError> {
        let mut builder = ClosureBuilder::new(store).force_realise(force_realise);
        let runtime = builder.build(target, DependencyKind::Runtime)?;
        let buildtime = builder.build(target, DependencyKind::Buildtime)?;
        Ok(Self::from_closure(&runtime, depth).merge(Self::from_closure(&buildtime, depth)))
    }

    /// 이미 구성된 클로저로부터 목록을 만듭니다.
    pub fn from_closure(closure: &Closure, depth: Option<u32>) -> Self {
        let edges = match depth {
            Some(depth) => restrict_edges(closure, depth),
            None => closure.edge_list(),
        };

        let components = if edges.is_empty() {
            info!(target_path = %closure.target, "no dependencies, inventory holds target only");
            closure
                .records
                .iter()
                .filter(|r| r.store_path == closure.target_deriver)
                .cloned()
                .collect()
        } else {
            let paths: BTreeSet<&str> = edges
                .iter()
                .flat_map(|e| [e.src_path.as_str(), e.target_path.as_str()])
                .collect();
            closure
                .records
                .iter()
                .filter(|r| {
                    paths.contains(r.store_path.as_str())
                        || r.outputs.iter().any(|o| paths.contains(o.as_str()))
                })
                .cloned()
                .collect()
        };

        Self::assemble(
            closure.target.clone(),
            closure.target_deriver.clone(),
            closure.kinds.clone(),
            components,
            edges,
        )
    }

    /// 두 목록을 합칩니다. 대상 정보는 `self` 의 것을 유지합니다.
    pub fn merge(self, other: ComponentInventory) -> Self {
        let mut by_path: BTreeMap<String, DerivationRecord> = self
            .components
            .into_iter()
            .map(|r| (r.store_path.clone(), r))
            .collect();
        for record in other.components {
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

        let mut kinds = self.kinds;
        kinds.extend(other.kinds);
        let edges: BTreeSet<Edge> = self.edges.into_iter().chain(other.edges).collect();

        Self::assemble(
            self.target,
            self.target_deriver,
            kinds,
            by_path.into_values().collect(),
            edges.into_iter().collect(),
        )
    }

    /// 식별자의 직접 의존성 목록
    pub fn dependencies_of(&self, identity: &Identity) -> &[Identity] {
        self.dependencies
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 구성요소 수
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn assemble(
        target: String,
        target_deriver: String,
        kinds: BTreeSet<DependencyKind>,
        mut components: Vec<DerivationRecord>,
        edges: Vec<Edge>,
    ) -> Self {
        components.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.store_path.cmp(&b.store_path))
        });
        let dependencies = attribute_dependencies(&components, &edges);
        debug!(
            components = components.len(),
            edges = edges.len(),
            "assembled component inventory"
        );
        Self {
            target,
            target_deriver,
            kinds,
            components,
            edges,
            dependencies,
        }
    }
}

/// 시작 경로에서 `depth` 깊이까지 도달한 엣지만 남깁니다.
fn restrict_edges(closure: &Closure, depth: u32) -> Vec<Edge> {
    let graph = DependencyGraph::new(closure.edges.iter().cloned());
    let options = TraversalOptions::with_depth(depth).output(OutputKind::Table);
    let rows = match graph.traverse(&closure.start_path, &options) {
        Traversal::Table(rows) => rows,
        Traversal::Graph(_) => Vec::new(),
    };
    let edges: BTreeSet<Edge> = rows
        .into_iter()
        .map(|row| Edge::new(row.src_path, row.target_path))
        .collect();
    edges.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::RawMetadata;
    use crate::store::MemoryStore;

    fn meta(pname: &str, version: &str, out: &str) -> RawMetadata {
        RawMetadata::from([
            ("name".to_owned(), format!("{pname}-{version}")),
            ("pname".to_owned(), pname.to_owned()),
            ("version".to_owned(), version.to_owned()),
            ("out".to_owned(), out.to_owned()),
        ])
    }

    /// app -> lib -> base (런타임 체인)
    fn chain_store() -> MemoryStore {
        let mut store = MemoryStore::new("/nix/store");
        store
            .add_derivation("/nix/store/d1-app-1.drv", meta("app", "1", "/nix/store/o1-app-1"), &["/nix/store/o1-app-1"])
            .add_derivation("/nix/store/d2-lib-2.drv", meta("lib", "2", "/nix/store/o2-lib-2"), &["/nix/store/o2-lib-2"])
            .add_derivation("/nix/store/d3-base-3.drv", meta("base", "3", "/nix/store/o3-base-3"), &["/nix/store/o3-base-3"])
            .add_reference("/nix/store/o1-app-1", "/nix/store/o2-lib-2")
            .add_reference("/nix/store/o2-lib-2", "/nix/store/o3-base-3");
        store
    }

    #[test]
    fn full_inventory_sorted_by_name() {
        let store = chain_store();
        let inv = ComponentInventory::build(
            &store,
            "/nix/store/o1-app-1",
            DependencyKind::Runtime,
            None,
            false,
        )
        .unwrap();
        let names: Vec<&str> = inv.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["app-1", "base-3", "lib-2"]);
        assert_eq!(inv.edges.len(), 2);
        assert_eq!(inv.target_deriver, "/nix/store/d1-app-1.drv");
    }

    #[test]
    fn depth_restricts_components() {
        let store = chain_store();
        let inv = ComponentInventory::build(
            &store,
            "/nix/store/o1-app-1",
            DependencyKind::Runtime,
            Some(1),
            false,
        )
        .unwrap();
        let names: Vec<&str> = inv.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["app-1", "lib-2"]);
        assert_eq!(inv.edges.len(), 1);
    }

    #[test]
    fn leaf_target_falls_back_to_itself() {
        let store = chain_store();
        let inv = ComponentInventory::build(
            &store,
            "/nix/store/o3-base-3",
            DependencyKind::Runtime,
            None,
            false,
        )
        .unwrap();
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.components[0].store_path, "/nix/store/d3-base-3.drv");
        assert!(inv.edges.is_empty());
    }

    #[test]
    fn dependencies_of_reports_direct_deps() {
        let store = chain_store();
        let inv = ComponentInventory::build(
            &store,
            "/nix/store/o1-app-1",
            DependencyKind::Runtime,
            None,
            false,
        )
        .unwrap();
        let app = inv.components[0].identity.clone().unwrap();
        let deps: Vec<&str> = inv.dependencies_of(&app).iter().map(Identity::as_str).collect();
        assert_eq!(deps, vec!["pkg:nix/lib@2"]);
    }
}
