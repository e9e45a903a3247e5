//! storegraph-engine -- 패키지 스토어 의존성 그래프 엔진
//!
//! 빌드된 아티팩트에서 출발해 빌드타임/런타임 의존성 클로저를 재구성하고,
//! 각 derivation 에 식별자를 부여한 뒤 그래프 순회와 구성요소별 의존성 맵을 제공합니다.
//!
//! # Module Structure
//!
//! - [`error`]: 엔진 에러 (`EngineError`)
//! - [`config`]: 엔진 설정 (`GraphEngineConfig`, builder)
//! - [`types`]: 도메인 타입 (`StorePath`, `DependencyKind`, `Edge`)
//! - [`derivation`]: 식별자/버전 모델, `.drv` 파서 (`DerivationRecord`, `Identity`, `compare_versions`)
//! - [`store`]: 스토어 조회 (`StoreQuery` trait, `NixStore`, `MemoryStore`, `find_deriver`)
//! - [`closure`]: 클로저 구성 (`ClosureBuilder`, `Closure`, `DerivationCache`)
//! - [`graph`]: 그래프 순회와 출력 (`DependencyGraph`, `DotWriter`, `CsvWriter`)
//! - [`attribution`]: 구성요소별 직접 의존성 (`attribute_dependencies`)
//! - [`inventory`]: 구성요소 목록 (`ComponentInventory`)
//!
//! # Architecture
//!
//! ```text
//! target --> StoreQuery (nix-store / memory)
//!               |
//!          find_deriver --> ClosureBuilder --> DerivationCache
//!                                |
//!                     Closure { records, edges }
//!                                |
//!               +----------------+----------------+
//!               |                                 |
//!        DependencyGraph::traverse         ComponentInventory
//!               |                                 |
//!     +---------+---------+              attribute_dependencies
//!     |                   |                       |
//!  DotWriter          CsvWriter           Identity -> [Identity]
//! ```

pub mod attribution;
pub mod closure;
pub mod config;
pub mod derivation;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod store;
pub mod types;

// --- Public API Re-exports ---

// Configuration
pub use config::{GraphEngineConfig, GraphEngineConfigBuilder};

// Error
pub use error::EngineError;

// Types
pub use types::{DependencyKind, Edge, StorePath};

// Identity & version model
pub use derivation::version::compare_versions;
pub use derivation::{DerivationRecord, Identity};

// Store
pub use store::{MemoryStore, NixStore, StoreQuery, find_deriver};

// Closure
pub use closure::{Closure, ClosureBuilder, DerivationCache};

// Graph
pub use graph::{
    CsvWriter, DependencyGraph, DotWriter, GraphSink, OutputKind, TableSink, Traversal,
    TraversalOptions,
};

// Attribution
pub use attribution::{DependencyMap, attribute_dependencies};
pub use inventory::ComponentInventory;
