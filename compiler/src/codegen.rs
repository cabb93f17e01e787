// codegen.rs — C++ code generation for expression graphs
//
// Lowers an expression graph to the body of a per-sample processing routine.
// A single depth-first pass emits one statement per distinct node: children
// first, in a fixed order, then the node's own statement, guarded by the
// node's emit-once flag. Shared subexpressions therefore appear exactly once
// and both parents reference the same result symbol.
//
// Preconditions: node handles belong to `graph`; the program root produces
//                a value (loops do not).
// Postconditions: returns `GeneratedCode` with the C++ source string; the
//                 layout depth is back at its pre-call value.
// Failure modes: precondition violations panic (no recoverable errors).
// Side effects: flips the `generated` flag of every reached node, so a graph
//               is good for one generation pass only.

use std::fmt::Write as _;

use crate::graph::{ExprGraph, NodeId, NodeKind};
use crate::layout::Layout;

// ── Public types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Pre-declare every issued name via the pool instead of only the delay
    /// state slots.
    pub emit_globals: bool,
}

#[derive(Debug)]
pub struct GeneratedCode {
    pub cpp_source: String,
}

// ── Node generation protocol ────────────────────────────────────────────────

/// Emit the statement(s) for `id`, dependencies first.
///
/// Idempotent per node: a second visit is a no-op, which is what collapses
/// diamond-shared subexpressions to a single emission. Statements are
/// appended to `out` at the current `layout` depth; the net depth change of
/// any call is zero.
pub fn emit_node(graph: &mut ExprGraph, id: NodeId, layout: &mut Layout, out: &mut String) {
    if graph.node(id).generated {
        return;
    }
    let kind = graph.node(id).kind.clone();
    match &kind {
        NodeKind::Constant { value } => {
            let _ = writeln!(
                out,
                "{}const float {} = {};",
                layout.indent(),
                graph.node(id).result,
                format_float(*value)
            );
        }
        NodeKind::Binary { op, lhs, rhs } => {
            emit_node(graph, *lhs, layout, out);
            emit_node(graph, *rhs, layout, out);
            let _ = writeln!(
                out,
                "{}const float {} = {} {} {};",
                layout.indent(),
                graph.node(id).result,
                graph.node(*lhs).result,
                op.symbol(),
                graph.node(*rhs).result
            );
        }
        NodeKind::Call { callee, arg } => {
            emit_node(graph, *arg, layout, out);
            let _ = writeln!(
                out,
                "{}const float {} = {}({});",
                layout.indent(),
                graph.node(id).result,
                callee,
                graph.node(*arg).result
            );
        }
        NodeKind::Repeat {
            start,
            end,
            body,
            counter,
        } => {
            let _ = writeln!(
                out,
                "{}for (int {c} = {}; {c} < {}; {c}++) {{",
                layout.indent(),
                start,
                end,
                c = counter
            );
            layout.open();
            emit_node(graph, *body, layout, out);
            layout.close();
            let _ = writeln!(out, "{}}}", layout.indent());
        }
        NodeKind::Delay { input, state } => {
            emit_node(graph, *input, layout, out);
            // Read the previous sample before overwriting: this ordering is
            // what makes the node a one-sample delay.
            let _ = writeln!(
                out,
                "{}const float {} = {};",
                layout.indent(),
                graph.node(id).result,
                state
            );
            let _ = writeln!(
                out,
                "{}{} = {};",
                layout.indent(),
                state,
                graph.node(*input).result
            );
        }
    }
    graph.node_mut(id).generated = true;
}

// ── Program builder ─────────────────────────────────────────────────────────

/// Emit one complete `process` routine for `root` into `out`, using the
/// caller's layout. Depth is restored before returning.
pub fn emit_program_into(
    graph: &mut ExprGraph,
    root: NodeId,
    layout: &mut Layout,
    out: &mut String,
    options: &CodegenOptions,
) {
    assert!(
        graph.node(root).produces_value(),
        "program root {:?} produces no value",
        root
    );

    // Storage that must survive a `process` call cannot live inside the
    // routine. Delay state slots always land here; `emit_globals` widens the
    // dump to every issued name.
    let decl_start = out.len();
    if options.emit_globals {
        graph.names().emit_global_declarations(out);
    } else {
        for state in graph.state_names() {
            let _ = writeln!(out, "{}float {};", layout.indent(), state);
        }
    }
    if out.len() > decl_start {
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{}void process(size_t numFrames, size_t offset) {{",
        layout.indent()
    );
    layout.open();
    let _ = writeln!(out, "{}const auto max = offset + numFrames;", layout.indent());
    let _ = writeln!(
        out,
        "{}for (auto i = offset; i < max; i++) {{",
        layout.indent()
    );
    layout.open();

    emit_node(graph, root, layout, out);
    let _ = writeln!(
        out,
        "{}output[i] = {};",
        layout.indent(),
        graph.node(root).result
    );

    layout.close();
    let _ = writeln!(out, "{}}}", layout.indent());
    layout.close();
    let _ = writeln!(out, "{}}}", layout.indent());
}

/// Convenience wrapper: lower `root` with a fresh layout.
pub fn emit_program(
    graph: &mut ExprGraph,
    root: NodeId,
    options: &CodegenOptions,
) -> GeneratedCode {
    let mut layout = Layout::new();
    let mut out = String::with_capacity(1024);
    emit_program_into(graph, root, &mut layout, &mut out, options);
    debug_assert_eq!(layout.depth(), 0, "unbalanced emission");
    GeneratedCode { cpp_source: out }
}

/// Render a literal the way the emitted dialect expects: six fractional
/// digits, matching C++ `std::to_string(float)`.
fn format_float(value: f32) -> String {
    format!("{:.6}", value)
}

// ── Provenance ──────────────────────────────────────────────────────────────

/// Provenance metadata for reproducible lowering.
///
/// `graph_fingerprint`: SHA-256 of the graph's canonical compact JSON.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub graph_fingerprint: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the graph fingerprint (64 characters).
    pub fn graph_fingerprint_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.graph_fingerprint {
            let _ = write!(s, "{:02x}", b);
        }
        s
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"graph_fingerprint\": \"{}\",\n  \"compiler_version\": \"{}\"\n}}\n",
            self.graph_fingerprint_hex(),
            self.compiler_version,
        )
    }
}

/// Compute provenance from the graph's canonical JSON.
pub fn compute_provenance(graph: &ExprGraph) -> Provenance {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(graph.canonical_json().as_bytes());
    let result = hasher.finalize();
    let mut graph_fingerprint = [0u8; 32];
    graph_fingerprint.copy_from_slice(&result);

    Provenance {
        graph_fingerprint,
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}
