//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않으면 모든 호출은 no-op 입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `storegraph_`
//! - 구성 요소: `store_`, `closure_`, `graph_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 조회 종류 레이블 키 (requisites, references, deriver, outputs, show, metadata)
pub const LABEL_QUERY: &str = "query";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 의존성 종류 레이블 키 (runtime, buildtime)
pub const LABEL_KIND: &str = "kind";

/// 건너뛴 사유 레이블 키 (deriver_not_found, malformed_metadata)
pub const LABEL_REASON: &str = "reason";

// ─── Store 메트릭 ──────────────────────────────────────────────────

/// Store: 외부 조회 명령 실행 수 (counter, labels: query, result)
pub const STORE_QUERIES_TOTAL: &str = "storegraph_store_queries_total";

/// Store: 외부 조회 명령 소요 시간 (histogram, 초)
pub const STORE_QUERY_DURATION_SECONDS: &str = "storegraph_store_query_duration_seconds";

// ─── Closure 메트릭 ────────────────────────────────────────────────

/// Closure: 새로 로드된 derivation 레코드 수 (counter, label: kind)
pub const CLOSURE_DERIVATIONS_LOADED_TOTAL: &str = "storegraph_closure_derivations_loaded_total";

/// Closure: 건너뛴 노드 수 (counter, label: reason)
pub const CLOSURE_NODES_SKIPPED_TOTAL: &str = "storegraph_closure_nodes_skipped_total";

/// Closure: 생성된 의존성 엣지 수 (counter, label: kind)
pub const CLOSURE_EDGES_TOTAL: &str = "storegraph_closure_edges_total";

// ─── Graph 메트릭 ──────────────────────────────────────────────────

/// Graph: 순회 중 그려진 엣지 수 (counter)
pub const GRAPH_EDGES_DRAWN_TOTAL: &str = "storegraph_graph_edges_drawn_total";

/// Graph: 순회 작업 상한 도달 횟수 (counter)
pub const GRAPH_ITERATION_LIMIT_HITS_TOTAL: &str = "storegraph_graph_iteration_limit_hits_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    // Store
    describe_counter!(
        STORE_QUERIES_TOTAL,
        "Total number of external store query commands executed"
    );
    describe_histogram!(
        STORE_QUERY_DURATION_SECONDS,
        "Time spent in a single external store query in seconds"
    );

    // Closure
    describe_counter!(
        CLOSURE_DERIVATIONS_LOADED_TOTAL,
        "Total number of derivation records parsed into the closure cache"
    );
    describe_counter!(
        CLOSURE_NODES_SKIPPED_TOTAL,
        "Total number of closure nodes skipped due to recoverable errors"
    );
    describe_counter!(
        CLOSURE_EDGES_TOTAL,
        "Total number of dependency edges produced by closure building"
    );

    // Graph
    describe_counter!(
        GRAPH_EDGES_DRAWN_TOTAL,
        "Total number of edges emitted by graph traversals"
    );
    describe_counter!(
        GRAPH_ITERATION_LIMIT_HITS_TOTAL,
        "Number of traversals stopped by the iteration cap"
    );
}
