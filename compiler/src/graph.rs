// graph.rs — Expression graph over audio-rate signals
//
// Arena of nodes addressed by `NodeId` handles. Wiring the same handle into
// two parents shares the subexpression, which is what the emit-once pass
// keys on. The arena owns the `NamePool`, so every node's result symbol is
// fixed at construction and never changes afterwards.
//
// Preconditions: child handles passed to constructors were returned by this
//                graph. A foreign handle is a construction bug and panics.
// Postconditions: node ids are dense and children always precede parents,
//                 so the graph is acyclic by construction.
// Failure modes: none beyond the handle precondition.
// Side effects: none.

use std::fmt;

use serde::Serialize;

use crate::names::NamePool;

// ── Public types ────────────────────────────────────────────────────────────

/// Unique identifier for a node within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub u32);

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// The infix symbol in the emitted dialect.
    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
            BinOp::Mod => '%',
        }
    }

    fn result_base(self) -> &'static str {
        match self {
            BinOp::Add => "add_result",
            BinOp::Sub => "sub_result",
            BinOp::Mul => "mult_result",
            BinOp::Div => "div_result",
            BinOp::Mod => "mod_result",
        }
    }
}

/// The kind of an expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    /// A named numeric literal.
    Constant { value: f32 },
    /// An infix arithmetic operation over two operands.
    Binary { op: BinOp, lhs: NodeId, rhs: NodeId },
    /// A unary function call in the target dialect.
    Call { callee: String, arg: NodeId },
    /// A counted loop over `[start, end)` around `body`. Produces no value.
    Repeat {
        start: usize,
        end: usize,
        body: NodeId,
        counter: String,
    },
    /// A one-sample delay (z^-1). `state` is the persistent storage slot
    /// holding the previous sample's input.
    Delay { input: NodeId, state: String },
}

/// One element of the expression graph.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Left-hand side of the statement this node emits. Unused for `Repeat`.
    pub result: String,
    /// Emit-once guard, flipped during the generation pass and never reset.
    #[serde(skip)]
    pub generated: bool,
}

impl Node {
    /// Whether the node's statement defines `result`. False only for loops.
    pub fn produces_value(&self) -> bool {
        !matches!(self.kind, NodeKind::Repeat { .. })
    }
}

/// The expression graph: a node arena plus its naming authority.
#[derive(Debug, Default, Serialize)]
pub struct ExprGraph {
    nodes: Vec<Node>,
    #[serde(skip)]
    names: NamePool,
}

// ── Construction ────────────────────────────────────────────────────────────

impl ExprGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named constant. The caller-supplied name becomes the result
    /// symbol's base.
    pub fn constant(&mut self, name: &str, value: f32) -> NodeId {
        let result = self.names.unique(name);
        self.push(NodeKind::Constant { value }, result)
    }

    /// Add a binary operation over two existing nodes.
    pub fn binary(&mut self, op: BinOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.check(lhs);
        self.check(rhs);
        let result = self.names.unique(op.result_base());
        self.push(NodeKind::Binary { op, lhs, rhs }, result)
    }

    /// Add a unary function call applied to an existing node.
    pub fn call(&mut self, callee: &str, arg: NodeId) -> NodeId {
        self.check(arg);
        let result = self.names.unique(&format!("{}_result", callee));
        self.push(
            NodeKind::Call {
                callee: callee.to_string(),
                arg,
            },
            result,
        )
    }

    /// Add a counted loop over `[start, end)` around an existing body node.
    /// The loop counter symbol comes from the pool, so nested loops never
    /// shadow each other.
    pub fn repeat(&mut self, start: usize, end: usize, body: NodeId) -> NodeId {
        self.check(body);
        let counter = self.names.unique("i");
        let result = self.names.unique("loop");
        self.push(
            NodeKind::Repeat {
                start,
                end,
                body,
                counter,
            },
            result,
        )
    }

    /// Add a one-sample delay of an existing node. Claims a second symbol
    /// for the persistent state slot.
    pub fn delay(&mut self, input: NodeId) -> NodeId {
        self.check(input);
        let result = self.names.unique("z1_result");
        let state = self.names.unique("delay_state");
        self.push(NodeKind::Delay { input, state }, result)
    }

    fn push(&mut self, kind: NodeKind, result: String) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            kind,
            result,
            generated: false,
        });
        id
    }

    fn check(&self, id: NodeId) {
        assert!(
            (id.0 as usize) < self.nodes.len(),
            "node handle {:?} does not belong to this graph",
            id
        );
    }
}

// ── Access ──────────────────────────────────────────────────────────────────

impl ExprGraph {
    /// Look up a node. Panics on a handle from another graph.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> &NamePool {
        &self.names
    }

    /// Persistent storage slots claimed by delay nodes, in construction
    /// order. These need storage duration beyond one `process` call.
    pub fn state_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Delay { state, .. } => Some(state.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Compact JSON rendering with deterministic field and node order.
    /// Input to the provenance fingerprint.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("graph serialization is infallible")
    }
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for ExprGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ExprGraph ({} nodes)", self.nodes.len())?;
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Constant { value } => {
                    writeln!(f, "  n{}: const {} = {}", node.id.0, node.result, value)?;
                }
                NodeKind::Binary { op, lhs, rhs } => {
                    writeln!(
                        f,
                        "  n{}: {} = n{} {} n{}",
                        node.id.0,
                        node.result,
                        lhs.0,
                        op.symbol(),
                        rhs.0
                    )?;
                }
                NodeKind::Call { callee, arg } => {
                    writeln!(f, "  n{}: {} = {}(n{})", node.id.0, node.result, callee, arg.0)?;
                }
                NodeKind::Repeat { start, end, body, .. } => {
                    writeln!(f, "  n{}: for [{}, {}) over n{}", node.id.0, start, end, body.0)?;
                }
                NodeKind::Delay { input, state } => {
                    writeln!(
                        f,
                        "  n{}: {} = z^-1(n{}) via {}",
                        node.id.0, node.result, input.0, state
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_names_follow_bases() {
        let mut g = ExprGraph::new();
        let c = g.constant("frequency", 440.0);
        let s = g.call("sin", c);
        let a = g.binary(BinOp::Add, c, s);
        assert_eq!(g.node(c).result, "frequency");
        assert_eq!(g.node(s).result, "sin_result");
        assert_eq!(g.node(a).result, "add_result");
    }

    #[test]
    fn shared_handles_preserve_identity() {
        let mut g = ExprGraph::new();
        let c = g.constant("x", 1.0);
        let a = g.binary(BinOp::Add, c, c);
        let m = g.binary(BinOp::Mul, a, c);
        // Both parents see the same child node, not copies.
        match &g.node(a).kind {
            NodeKind::Binary { lhs, rhs, .. } => {
                assert_eq!(*lhs, c);
                assert_eq!(*rhs, c);
            }
            _ => panic!("expected binary node"),
        }
        match &g.node(m).kind {
            NodeKind::Binary { rhs, .. } => assert_eq!(*rhs, c),
            _ => panic!("expected binary node"),
        }
    }

    #[test]
    fn second_delay_gets_suffixed_state() {
        let mut g = ExprGraph::new();
        let c = g.constant("x", 1.0);
        let d1 = g.delay(c);
        let d2 = g.delay(d1);
        assert_eq!(g.state_names(), vec!["delay_state", "delay_state_1"]);
        assert_eq!(g.node(d2).result, "z1_result_0");
    }

    #[test]
    fn loops_produce_no_value() {
        let mut g = ExprGraph::new();
        let c = g.constant("x", 1.0);
        let r = g.repeat(0, 4, c);
        assert!(g.node(c).produces_value());
        assert!(!g.node(r).produces_value());
    }

    #[test]
    #[should_panic(expected = "does not belong to this graph")]
    fn foreign_handle_is_rejected() {
        let mut g = ExprGraph::new();
        let c = g.constant("x", 1.0);
        let _ = c;
        g.binary(BinOp::Add, NodeId(7), NodeId(7));
    }

    #[test]
    fn canonical_json_is_deterministic() {
        let build = || {
            let mut g = ExprGraph::new();
            let c = g.constant("x", 1.0);
            let d = g.delay(c);
            g.binary(BinOp::Add, c, d);
            g
        };
        assert_eq!(build().canonical_json(), build().canonical_json());
    }

    #[test]
    fn display_lists_every_node() {
        let mut g = ExprGraph::new();
        let c = g.constant("x", 1.0);
        g.repeat(0, 8, c);
        let text = g.to_string();
        assert!(text.starts_with("ExprGraph (2 nodes)"));
        assert!(text.contains("n0: const x = 1"));
        assert!(text.contains("n1: for [0, 8) over n0"));
    }
}
