//! 의존성 귀속 -- 엣지 목록을 구성요소별 직접 의존성 식별자 맵으로 변환
//!
//! - 런타임: `target_path` 가 C 의 출력이고 `src_path` 가 D 의 출력인 엣지
//! - 빌드타임: `target_path == C.store_path` 이고 `src_path == D.store_path` 인 엣지
//!
//! 경로 → 구성요소 색인을 한 번 만들어 엣지를 한 번만 훑습니다.
//! 결과 목록은 런타임 의존성(정렬) 다음 빌드타임 의존성(정렬) 순서이며
//! 식별자 기준으로 중복과 자기 자신을 제거합니다.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::derivation::{DerivationRecord, Identity};
use crate::types::Edge;

/// 구성요소 식별자 → 직접 의존성 식별자 목록
pub type DependencyMap = BTreeMap<Identity, Vec<Identity>>;

/// 구성요소별 직접 의존성을 계산합니다.
///
/// 식별자가 없는 구성요소(원시 소스)는 키와 값 어디에도 나타나지 않습니다.
/// 같은 식별자를 가진 구성요소가 여럿이면 하나의 키로 합쳐집니다.
pub fn attribute_dependencies<'e, I>(components: &[DerivationRecord], edges: I) -> DependencyMap
where
    I: IntoIterator<Item = &'e Edge>,
{
    let mut by_output: HashMap<&str, usize> = HashMap::new();
    let mut by_drv: HashMap<&str, usize> = HashMap::new();
    for (i, component) in components.iter().enumerate() {
        by_drv.entry(component.store_path.as_str()).or_insert(i);
        for out in &component.outputs {
            by_output.entry(out.as_str()).or_insert(i);
        }
    }

    let mut runtime: Vec<BTreeSet<&Identity>> = vec![BTreeSet::new(); components.len()];
    let mut buildtime: Vec<BTreeSet<&Identity>> = vec![BTreeSet::new(); components.len()];

    for edge in edges {
        let target = edge.target_path.as_str();
        let src = edge.src_path.as_str();
        if let (Some(&c), Some(&d)) = (by_output.get(target), by_output.get(src))
            && let Some(id) = components[d].identity.as_ref()
        {
            runtime[c].insert(id);
        }
        if let (Some(&c), Some(&d)) = (by_drv.get(target), by_drv.get(src))
            && let Some(id) = components[d].identity.as_ref()
        {
            buildtime[c].insert(id);
        }
    }

    let mut map = DependencyMap::new();
    for (i, component) in components.iter().enumerate() {
        let Some(own) = component.identity.as_ref() else {
            continue;
        };
        let deps = map.entry(own.clone()).or_default();
        for id in runtime[i].iter().chain(buildtime[i].iter()) {
            if *id != own && !deps.contains(*id) {
                deps.push((*id).clone());
            }
        }
    }
    map
}
