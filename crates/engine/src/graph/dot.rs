//! DOT 그래프 출력
//!
//! [`RenderedGraph`]를 `petgraph` 그래프로 옮긴 뒤 Graphviz DOT 텍스트로 기록합니다.
//! 왼쪽에서 오른쪽 배치, 둥근 상자 노드, 엣지는 target → src 방향입니다.

use std::io::Write;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};

use super::{GraphNode, RenderedGraph};
use crate::error::EngineError;

/// 기본 노드 채움 색
pub const DEFAULT_FILL: &str = "#EEEEEE";

/// 강조 노드 채움 색
pub const HIGHLIGHT_FILL: &str = "#FFE6E6";

/// 그래프 출력 대상 trait
pub trait GraphSink {
    /// 순회 결과 그래프를 출력합니다.
    fn render_graph(&mut self, graph: &RenderedGraph) -> Result<(), EngineError>;
}

/// DOT 텍스트 출력기
pub struct DotWriter<W: Write> {
    writer: W,
}

impl<W: Write> DotWriter<W> {
    /// 출력 대상을 감쌉니다.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 내부 출력 대상을 돌려받습니다.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> GraphSink for DotWriter<W> {
    fn render_graph(&mut self, graph: &RenderedGraph) -> Result<(), EngineError> {
        let dot = to_dot(graph);
        self.writer
            .write_all(dot.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| EngineError::Render(format!("failed to write dot output: {e}")))
    }
}

/// 그래프를 DOT 문자열로 변환합니다.
pub fn to_dot(graph: &RenderedGraph) -> String {
    let mut g: DiGraph<&str, &str> = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
    let indices: Vec<NodeIndex> = graph
        .nodes
        .iter()
        .map(|n| g.add_node(n.name.as_str()))
        .collect();

    for edge in &graph.edges {
        if let (Some(t), Some(s)) = (
            graph.node_position(&edge.target_path),
            graph.node_position(&edge.src_path),
        ) {
            g.add_edge(indices[t], indices[s], "");
        }
    }

    let edge_attrs = |_: &DiGraph<&str, &str>, _: EdgeReference<'_, &str>| String::new();
    let node_attrs = |_: &DiGraph<&str, &str>, (idx, _): (NodeIndex, &&str)| {
        graph
            .nodes
            .get(idx.index())
            .map(|n| node_attributes(n, graph.pathnames))
            .unwrap_or_default()
    };
    let body = Dot::with_attr_getters(
        &g,
        &[Config::GraphContentOnly, Config::NodeNoLabel, Config::EdgeNoLabel],
        &edge_attrs,
        &node_attrs,
    );

    format!(
        "digraph {{\n    rankdir=LR;\n    concentrate=false;\n    node [shape=box style=\"rounded,filled\" margin=\"0.3,0.1\"];\n{body}}}\n"
    )
}

fn node_attributes(node: &GraphNode, pathnames: bool) -> String {
    let name = html_escape(&node.name);
    let label = if pathnames {
        format!(
            "<{name}<BR/><FONT POINT-SIZE=\"8\">{}</FONT>>",
            html_escape(&node.path)
        )
    } else {
        format!("\"{}\"", name.replace('\\', "\\\\"))
    };
    let fill = if node.highlighted {
        HIGHLIGHT_FILL
    } else {
        DEFAULT_FILL
    };
    format!(
        "label = {label} fillcolor = \"{fill}\" tooltip = \"{}\" ",
        html_escape(&node.path)
    )
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyGraph, Traversal, TraversalOptions};
    use crate::types::Edge;

    fn rendered(options: TraversalOptions) -> RenderedGraph {
        let g = DependencyGraph::new(vec![
            Edge::new("/nix/store/b-glibc-2.37", "/nix/store/a-hello-2.12"),
            Edge::new("/nix/store/c-zlib-1.3", "/nix/store/a-hello-2.12"),
        ]);
        match g.traverse("/nix/store/a-hello-2.12", &options) {
            Traversal::Graph(graph) => graph,
            Traversal::Table(_) => panic!("expected graph"),
        }
    }

    #[test]
    fn dot_has_layout_header_and_all_edges() {
        let dot = to_dot(&rendered(TraversalOptions::with_depth(1)));
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("\"hello-2.12\""));
        assert!(dot.contains("\"glibc-2.37\""));
        assert_eq!(dot.matches("->").count(), 2);
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn colorized_nodes_use_highlight_fill() {
        let options = TraversalOptions::with_depth(1).colorize("zlib").unwrap();
        let dot = to_dot(&rendered(options));
        assert_eq!(dot.matches(HIGHLIGHT_FILL).count(), 1);
        assert_eq!(dot.matches(DEFAULT_FILL).count(), 2);
    }

    #[test]
    fn pathnames_use_html_label() {
        let dot = to_dot(&rendered(TraversalOptions::with_depth(1).pathnames(true)));
        assert!(dot.contains("<BR/><FONT POINT-SIZE=\"8\">/nix/store/a-hello-2.12</FONT>"));
    }

    #[test]
    fn writer_emits_to_sink() {
        let mut writer = DotWriter::new(Vec::new());
        writer
            .render_graph(&rendered(TraversalOptions::with_depth(1)))
            .unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.contains("digraph"));
    }

    #[test]
    fn html_escape_handles_markup() {
        assert_eq!(html_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
