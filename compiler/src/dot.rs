// dot.rs — Graphviz DOT output for expression graphs
//
// Transforms an ExprGraph into DOT format suitable for rendering with
// `dot`, `neato`, or other Graphviz layout engines. Edges point from a
// child to the parent consuming its value, labelled by the operand role.
//
// Preconditions: `graph` is a fully constructed ExprGraph.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::graph::{ExprGraph, Node, NodeKind};

/// Emit the expression graph as a Graphviz DOT string.
pub fn emit_dot(graph: &ExprGraph) -> String {
    let mut buf = String::new();
    writeln!(buf, "digraph sgc {{").unwrap();
    writeln!(buf, "    rankdir=LR;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];").unwrap();
    writeln!(buf).unwrap();

    for node in graph.nodes() {
        writeln!(
            buf,
            "    n{} [label=\"{}\", shape={}];",
            node.id.0,
            node_label(node),
            node_shape(&node.kind)
        )
        .unwrap();
    }

    writeln!(buf).unwrap();
    for node in graph.nodes() {
        match &node.kind {
            NodeKind::Constant { .. } => {}
            NodeKind::Binary { lhs, rhs, .. } => {
                writeln!(buf, "    n{} -> n{} [label=\"lhs\"];", lhs.0, node.id.0).unwrap();
                writeln!(buf, "    n{} -> n{} [label=\"rhs\"];", rhs.0, node.id.0).unwrap();
            }
            NodeKind::Call { arg, .. } => {
                writeln!(buf, "    n{} -> n{} [label=\"arg\"];", arg.0, node.id.0).unwrap();
            }
            NodeKind::Repeat { body, .. } => {
                writeln!(
                    buf,
                    "    n{} -> n{} [label=\"body\", style=dashed];",
                    body.0, node.id.0
                )
                .unwrap();
            }
            NodeKind::Delay { input, .. } => {
                writeln!(buf, "    n{} -> n{} [label=\"input\"];", input.0, node.id.0).unwrap();
            }
        }
    }

    writeln!(buf, "}}").unwrap();
    buf
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Return the display label for a node.
fn node_label(node: &Node) -> String {
    match &node.kind {
        NodeKind::Constant { value } => format!("{} = {}", escape(&node.result), value),
        NodeKind::Binary { op, .. } => op.symbol().to_string(),
        NodeKind::Call { callee, .. } => format!("{}()", escape(callee)),
        NodeKind::Repeat { start, end, .. } => format!("for [{}, {})", start, end),
        NodeKind::Delay { .. } => "z^-1".to_string(),
    }
}

/// Return the DOT shape for a node kind. Delay nodes are drawn as cylinders
/// since they carry persistent storage.
fn node_shape(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Constant { .. } => "ellipse",
        NodeKind::Binary { .. } => "circle",
        NodeKind::Call { .. } => "box",
        NodeKind::Repeat { .. } => "box3d",
        NodeKind::Delay { .. } => "cylinder",
    }
}

/// Escape label text to valid DOT double-quoted string content.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
