//! Graph Traversal Engine -- 엣지 관계의 깊이 제한 재귀 탐색
//!
//! 엣지 목록을 조회 가능한 관계로 보고 순방향(대상 → 의존성) 또는
//! 역방향(의존성 → 이를 사용하는 쪽)으로 탐색하여 그래프나 깊이 표를 만듭니다.
//!
//! 재귀 호출 대신 명시적 작업 스택을 사용하므로 깊이가 매우 커도 호출 스택이
//! 늘어나지 않습니다. 방문 집합은 `(target_path, src_path)` 쌍을 키로 사용합니다.
//!
//! - [`dot`]: DOT 그래프 출력 ([`GraphSink`])
//! - [`table`]: CSV 표 출력 ([`TableSink`])

pub mod dot;
pub mod table;

pub use dot::{DotWriter, GraphSink};
pub use table::{CsvWriter, TableSink};

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use storegraph_core::metrics as m;

use crate::error::EngineError;
use crate::types::Edge;

/// 이름 정규식 필터
///
/// `until` 과 `colorize` 는 이름의 시작부터 일치해야 하고(앵커),
/// `inverse` 는 이름 안 어디서든 일치하면 됩니다.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// 이름 시작부터 일치해야 하는 패턴을 컴파일합니다.
    pub fn anchored(field: &str, pattern: &str) -> Result<Self, EngineError> {
        Self::compile(field, pattern, &format!("^(?:{pattern})"))
    }

    /// 이름 안 어디서든 일치하면 되는 패턴을 컴파일합니다.
    pub fn search(field: &str, pattern: &str) -> Result<Self, EngineError> {
        Self::compile(field, pattern, pattern)
    }

    fn compile(field: &str, source: &str, pattern: &str) -> Result<Self, EngineError> {
        let regex = Regex::new(pattern).map_err(|e| EngineError::InvalidPattern {
            field: field.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    /// 이름이 패턴과 일치하는지 확인합니다. 빈 이름은 일치하지 않습니다.
    pub fn matches(&self, name: &str) -> bool {
        !name.is_empty() && self.regex.is_match(name)
    }

    /// 사용자가 입력한 원래 패턴
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// 순회 출력 종류 (호출자가 요청한 출력 형식으로 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// 노드/엣지 그래프
    #[default]
    Graph,
    /// 깊이가 붙은 표
    Table,
}

/// 순회 옵션
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// 최대 재귀 깊이 (1 이면 시작 필터의 직접 일치만)
    pub max_depth: u32,
    /// 대상 이름이 일치하면 확장을 멈춤 (행은 기록됨)
    pub until: Option<NamePattern>,
    /// 설정되면 역방향 모드: `src` 이름이 일치하는 노드마다 시작
    pub inverse: Option<NamePattern>,
    /// 노드 강조 색상 조건
    pub colorize: Option<NamePattern>,
    /// 노드 라벨에 경로 포함
    pub pathnames: bool,
    /// 출력 종류
    pub output: OutputKind,
    /// 작업 항목 상한 (깊이가 커도 전체 작업을 제한)
    pub max_iterations: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            until: None,
            inverse: None,
            colorize: None,
            pathnames: false,
            output: OutputKind::Graph,
            max_iterations: 1_000_000,
        }
    }
}

impl TraversalOptions {
    /// 최대 깊이로 옵션을 생성합니다.
    pub fn with_depth(max_depth: u32) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// 확장 중단 패턴을 설정합니다.
    pub fn until(mut self, pattern: &str) -> Result<Self, EngineError> {
        self.until = Some(NamePattern::anchored("until", pattern)?);
        Ok(self)
    }

    /// 역방향 시작 패턴을 설정합니다.
    pub fn inverse(mut self, pattern: &str) -> Result<Self, EngineError> {
        self.inverse = Some(NamePattern::search("inverse", pattern)?);
        Ok(self)
    }

    /// 강조 패턴을 설정합니다.
    pub fn colorize(mut self, pattern: &str) -> Result<Self, EngineError> {
        self.colorize = Some(NamePattern::anchored("colorize", pattern)?);
        Ok(self)
    }

    /// 출력 종류를 설정합니다.
    pub fn output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    /// 경로 라벨 여부를 설정합니다.
    pub fn pathnames(mut self, pathnames: bool) -> Self {
        self.pathnames = pathnames;
        self
    }

    /// 작업 항목 상한을 설정합니다.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }
}

/// 그래프 노드
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// 스토어 경로 (노드 식별자)
    pub path: String,
    /// 표시 이름
    pub name: String,
    /// 강조 여부
    pub highlighted: bool,
}

/// 그래프 모드 순회 결과
///
/// 노드는 처음 추가된 순서대로, 엣지는 그려진 순서대로 보관합니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderedGraph {
    /// 노드 목록 (경로 기준 중복 없음)
    pub nodes: Vec<GraphNode>,
    /// 그려진 엣지 (렌더링 시 target → src 방향)
    pub edges: Vec<Edge>,
    /// 노드 라벨에 경로 포함 여부
    pub pathnames: bool,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
}

impl RenderedGraph {
    fn add_node(&mut self, path: &str, name: &str, colorize: Option<&NamePattern>) {
        if self.node_index.contains_key(path) {
            return;
        }
        self.node_index.insert(path.to_owned(), self.nodes.len());
        self.nodes.push(GraphNode {
            path: path.to_owned(),
            name: name.to_owned(),
            highlighted: colorize.is_some_and(|p| p.matches(name)),
        });
    }

    /// 경로로 노드 위치를 찾습니다.
    pub fn node_position(&self, path: &str) -> Option<usize> {
        self.node_index.get(path).copied()
    }

    /// 그려진 것이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// 표 모드의 한 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// 행이 일치한 깊이 (1 부터)
    pub graph_depth: u32,
    /// 소비되는 쪽 경로
    pub src_path: String,
    /// 소비되는 쪽 이름
    pub src_pname: String,
    /// 의존하는 쪽 경로
    pub target_path: String,
    /// 의존하는 쪽 이름
    pub target_pname: String,
}

impl TableRow {
    fn new(depth: u32, edge: &Edge) -> Self {
        Self {
            graph_depth: depth,
            src_path: edge.src_path.clone(),
            src_pname: edge.src_name.clone(),
            target_path: edge.target_path.clone(),
            target_pname: edge.target_name.clone(),
        }
    }
}

/// 순회 결과
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Traversal {
    /// 그래프 출력
    Graph(RenderedGraph),
    /// 표 출력
    Table(Vec<TableRow>),
}

impl Traversal {
    /// 결과가 비어 있는지 여부 ("nothing to draw")
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Graph(g) => g.is_empty(),
            Self::Table(rows) => rows.is_empty(),
        }
    }
}

/// 엣지 필터 -- 경로 정확 일치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter<'a> {
    /// `target_path == path` (순방향)
    Target(&'a str),
    /// `src_path == path` (역방향)
    Src(&'a str),
}

/// 조회 가능한 엣지 관계
///
/// 엣지는 정렬된 순서로 보관되며 `target_path`, `src_path` 색인을 가집니다.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Vec<Edge>,
    by_target: HashMap<String, Vec<usize>>,
    by_src: HashMap<String, Vec<usize>>,
}

/// 작업 스택 프레임 -- 한 번의 필터 조회 결과와 진행 위치
struct Frame {
    rows: Vec<usize>,
    depth: u32,
    cursor: usize,
}

/// 순회 중 변하는 상태
struct TraversalState<'g> {
    visited: HashSet<(&'g str, &'g str)>,
    graph: RenderedGraph,
    rows: Vec<TableRow>,
    iterations: usize,
    truncated: bool,
}

impl DependencyGraph {
    /// 엣지 목록으로 관계를 만듭니다. 중복 엣지는 하나로 합칩니다.
    pub fn new(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut edges: Vec<Edge> = edges.into_iter().collect();
        edges.sort();
        edges.dedup();

        let mut by_target: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_src: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            by_target.entry(edge.target_path.clone()).or_default().push(i);
            by_src.entry(edge.src_path.clone()).or_default().push(i);
        }
        Self {
            edges,
            by_target,
            by_src,
        }
    }

    /// 모든 엣지 (정렬됨)
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// 필터와 일치하는 엣지 위치 (정렬 순서)
    pub fn matching(&self, filter: EdgeFilter<'_>) -> &[usize] {
        let found = match filter {
            EdgeFilter::Target(path) => self.by_target.get(path),
            EdgeFilter::Src(path) => self.by_src.get(path),
        };
        found.map(Vec::as_slice).unwrap_or(&[])
    }

    /// 순회를 실행합니다.
    ///
    /// `options.inverse` 가 설정되면 `start_path` 는 무시되고, `src` 이름이
    /// 일치하는 서로 다른 `src_path` 마다 역방향 순회를 시작합니다
    /// (방문 집합은 공유). 아니면 `target_path == start_path` 에서 순방향으로 시작합니다.
    pub fn traverse(&self, start_path: &str, options: &TraversalOptions) -> Traversal {
        let mut state = TraversalState {
            visited: HashSet::new(),
            graph: RenderedGraph {
                pathnames: options.pathnames,
                ..RenderedGraph::default()
            },
            rows: Vec::new(),
            iterations: 0,
            truncated: false,
        };

        match &options.inverse {
            Some(pattern) => {
                let mut seeds: Vec<&str> = Vec::new();
                for edge in &self.edges {
                    if pattern.matches(&edge.src_name) && !seeds.contains(&edge.src_path.as_str()) {
                        seeds.push(&edge.src_path);
                    }
                }
                if seeds.is_empty() {
                    debug!(pattern = pattern.as_str(), "no matching packages found");
                }
                for seed in seeds {
                    debug!(start = seed, "start path inverse");
                    self.run(EdgeFilter::Src(seed), options, &mut state);
                    if state.truncated {
                        break;
                    }
                }
            }
            None => {
                debug!(start = start_path, "start path");
                self.run(EdgeFilter::Target(start_path), options, &mut state);
            }
        }

        match options.output {
            OutputKind::Graph => Traversal::Graph(state.graph),
            OutputKind::Table => Traversal::Table(state.rows),
        }
    }

    /// 시작 필터 하나에서 깊이 우선(전위) 순서로 탐색합니다.
    fn run<'g>(
        &'g self,
        start: EdgeFilter<'g>,
        options: &TraversalOptions,
        state: &mut TraversalState<'g>,
    ) {
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.open_frame(start, 1, options, state) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.cursor >= frame.rows.len() {
                stack.pop();
                continue;
            }
            let row = frame.rows[frame.cursor];
            let depth = frame.depth;
            frame.cursor += 1;

            state.iterations += 1;
            if state.iterations > options.max_iterations {
                warn!(
                    max_iterations = options.max_iterations,
                    "traversal iteration limit reached, output is truncated"
                );
                metrics::counter!(m::GRAPH_ITERATION_LIMIT_HITS_TOTAL).increment(1);
                state.truncated = true;
                return;
            }

            let edge = &self.edges[row];
            trace!(depth, target_path = %edge.target_path, src = %edge.src_path, "found");

            if options
                .until
                .as_ref()
                .is_some_and(|p| p.matches(&edge.target_name))
            {
                debug!(depth, target_name = %edge.target_name, "reached until pattern");
                continue;
            }
            if !state
                .visited
                .insert((edge.target_path.as_str(), edge.src_path.as_str()))
            {
                debug!(depth, "skipping duplicate path");
                continue;
            }

            if options.output == OutputKind::Graph {
                let colorize = options.colorize.as_ref();
                state.graph.add_node(&edge.src_path, &edge.src_name, colorize);
                state.graph.add_node(&edge.target_path, &edge.target_name, colorize);
                state.graph.edges.push(edge.clone());
                metrics::counter!(m::GRAPH_EDGES_DRAWN_TOTAL).increment(1);
            }

            let next = if options.inverse.is_some() {
                EdgeFilter::Src(&edge.target_path)
            } else {
                EdgeFilter::Target(&edge.src_path)
            };
            if let Some(frame) = self.open_frame(next, depth + 1, options, state) {
                stack.push(frame);
            }
        }
    }

    /// 필터를 조회하여 새 프레임을 엽니다. 확장할 행이 없으면 `None`.
    fn open_frame(
        &self,
        filter: EdgeFilter<'_>,
        depth: u32,
        options: &TraversalOptions,
        state: &mut TraversalState<'_>,
    ) -> Option<Frame> {
        if depth > options.max_depth {
            trace!(max_depth = options.max_depth, "reached max depth");
            return None;
        }
        let rows = self.matching(filter);
        if rows.is_empty() {
            if depth == 1 {
                debug!(?filter, "no matching packages found");
            } else {
                debug!(depth, "found nothing");
            }
            return None;
        }
        if options.output == OutputKind::Table {
            state
                .rows
                .extend(rows.iter().map(|&i| TableRow::new(depth, &self.edges[i])));
        }
        Some(Frame {
            rows: rows.to_vec(),
            depth,
            cursor: 0,
        })
    }
}
