//! Store Resolver -- 임의의 스토어 경로를 권위 있는 build-description 경로로 해석
//!
//! 두 조회 소스는 항상 일관되지 않습니다. 한쪽은 deriver 관계가 없으면
//! `unknown-deriver` 를 보고하고, 다른 쪽은 후보가 없거나 여러 개일 수 있습니다.
//!
//! # 해석 순서
//!
//! 1. 경로가 이미 `.drv` 이면 그대로 반환
//! 2. 첫 번째 소스의 응답이 존재하는 객체이면 반환 (두 소스가 달라도 첫 번째가 우선)
//! 3. 두 번째 소스 JSON 의 첫 키가 존재하는 객체이면 반환
//! 4. 그 외에는 두 후보를 담아 [`EngineError::DeriverNotFound`]

use tracing::{debug, trace};

use super::StoreQuery;
use crate::error::EngineError;
use crate::types::StorePath;

/// 주어진 경로의 deriver(build-description 경로)를 찾습니다.
pub fn find_deriver<S: StoreQuery + ?Sized>(store: &S, path: &str) -> Result<String, EngineError> {
    if StorePath::new(path).is_derivation() {
        return Ok(path.to_owned());
    }

    let candidates = store.query_deriver(path)?;
    let primary = candidates.primary.filter(|p| !p.is_empty());
    let fallback = candidates
        .fallback_json
        .as_deref()
        .and_then(|json| first_json_key(json, store.store_dir()));
    trace!(path, ?primary, ?fallback, "deriver candidates");

    if let Some(ref p) = primary
        && store.exists(p)?
    {
        if let Some(ref f) = fallback
            && f != p
        {
            debug!(path, primary = %p, fallback = %f, "deriver sources disagree, using primary");
        }
        return Ok(p.clone());
    }

    if let Some(ref f) = fallback
        && store.exists(f)?
    {
        return Ok(f.clone());
    }

    Err(EngineError::DeriverNotFound {
        path: path.to_owned(),
        primary,
        fallback,
    })
}

/// build-description JSON 의 첫 번째 키를 후보로 추출합니다.
///
/// 절대 경로가 아닌 키에는 스토어 디렉토리를 붙입니다. JSON 이 아니거나 비어 있으면 `None`.
fn first_json_key(json: &str, store_dir: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let key = value.as_object()?.keys().next()?;
    if key.starts_with('/') {
        Some(key.clone())
    } else {
        Some(format!("{}/{}", store_dir.trim_end_matches('/'), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DeriverCandidates, MemoryStore};

    const OUT: &str = "/nix/store/o-hello-2.12";
    const DRV_A: &str = "/nix/store/a-hello-2.12.drv";
    const DRV_B: &str = "/nix/store/b-hello-2.12.drv";

    fn store_with(candidates: DeriverCandidates, existing: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::new("/nix/store");
        store.add_path(OUT);
        for p in existing {
            store.add_path(p);
        }
        store.set_deriver_candidates(OUT, candidates);
        store
    }

    #[test]
    fn derivation_path_is_returned_unchanged() {
        let store = MemoryStore::new("/nix/store");
        assert_eq!(find_deriver(&store, DRV_A).unwrap(), DRV_A);
    }

    #[test]
    fn primary_wins_when_it_exists() {
        let store = store_with(
            DeriverCandidates {
                primary: Some(DRV_A.to_owned()),
                fallback_json: Some(format!(r#"{{"{DRV_B}":{{}}}}"#)),
            },
            &[DRV_A, DRV_B],
        );
        assert_eq!(find_deriver(&store, OUT).unwrap(), DRV_A);
    }

    #[test]
    fn fallback_used_when_primary_missing() {
        let store = store_with(
            DeriverCandidates {
                primary: None,
                fallback_json: Some(format!(r#"{{"{DRV_B}":{{"outputs":{{}}}}}}"#)),
            },
            &[DRV_B],
        );
        assert_eq!(find_deriver(&store, OUT).unwrap(), DRV_B);
    }

    #[test]
    fn fallback_used_when_primary_does_not_exist() {
        let store = store_with(
            DeriverCandidates {
                primary: Some(DRV_A.to_owned()),
                fallback_json: Some(format!(r#"{{"{DRV_B}":{{}}}}"#)),
            },
            &[DRV_B],
        );
        assert_eq!(find_deriver(&store, OUT).unwrap(), DRV_B);
    }

    #[test]
    fn relative_fallback_key_gets_store_dir() {
        let store = store_with(
            DeriverCandidates {
                primary: None,
                fallback_json: Some(r#"{"b-hello-2.12.drv":{}}"#.to_owned()),
            },
            &[DRV_B],
        );
        assert_eq!(find_deriver(&store, OUT).unwrap(), DRV_B);
    }

    #[test]
    fn neither_candidate_exists_reports_both() {
        let store = store_with(
            DeriverCandidates {
                primary: Some(DRV_A.to_owned()),
                fallback_json: Some(format!(r#"{{"{DRV_B}":{{}}}}"#)),
            },
            &[],
        );
        let err = find_deriver(&store, OUT).unwrap_err();
        match err {
            EngineError::DeriverNotFound {
                primary, fallback, ..
            } => {
                assert_eq!(primary.as_deref(), Some(DRV_A));
                assert_eq!(fallback.as_deref(), Some(DRV_B));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_or_invalid_fallback_is_ignored() {
        assert_eq!(first_json_key("{}", "/nix/store"), None);
        assert_eq!(first_json_key("not json", "/nix/store"), None);
        assert_eq!(first_json_key("[1,2]", "/nix/store"), None);
    }

    #[test]
    fn no_candidates_is_deriver_not_found() {
        let store = store_with(DeriverCandidates::default(), &[]);
        let err = find_deriver(&store, OUT).unwrap_err();
        assert!(err.is_recoverable());
    }
}
