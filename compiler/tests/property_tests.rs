// Property-based tests for emitter invariants.
//
// Three categories:
// 1. Name pool: returned names are pairwise distinct, bases are
//    first-come-first-served
// 2. Emit-once: in any randomly shared DAG each value node defines its
//    result exactly once, and a second pass adds nothing
// 3. Layout: nested loop emission always returns to the starting depth
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use std::collections::HashSet;

use proptest::prelude::*;

use sgc::codegen::{emit_node, emit_program, CodegenOptions};
use sgc::graph::{BinOp, ExprGraph};
use sgc::layout::Layout;
use sgc::names::NamePool;

/// Base-name strategy biased toward collisions, including bases that look
/// like counter-suffixed forms.
fn arb_base() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("x".to_string()),
        Just("x_0".to_string()),
        Just("x_1".to_string()),
        Just("y".to_string()),
        "[a-z][a-z0-9_]{0,6}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn issued_names_are_pairwise_distinct(bases in prop::collection::vec(arb_base(), 0..40)) {
        let mut pool = NamePool::new();
        let mut seen = HashSet::new();
        for base in &bases {
            let name = pool.unique(base);
            prop_assert!(seen.insert(name.clone()), "duplicate name {}", name);
        }
        prop_assert_eq!(seen.len(), pool.len());
    }

    #[test]
    fn first_request_wins_the_base(base in "[a-z][a-z0-9_]{0,6}") {
        let mut pool = NamePool::new();
        let first = pool.unique(&base);
        let second = pool.unique(&base);
        prop_assert_eq!(first.as_str(), base.as_str());
        let prefix = format!("{}_", base);
        prop_assert!(second.starts_with(&prefix), "second did not start with expected prefix");
    }

    #[test]
    fn shared_nodes_emit_exactly_once(
        steps in prop::collection::vec((0u8..7, 0usize..64, 0usize..64), 1..24),
    ) {
        let mut g = ExprGraph::new();
        let mut ids = vec![g.constant("seed", 1.0)];
        for (sel, a, b) in steps {
            let lhs = ids[a % ids.len()];
            let rhs = ids[b % ids.len()];
            let id = match sel {
                0 => g.binary(BinOp::Add, lhs, rhs),
                1 => g.binary(BinOp::Sub, lhs, rhs),
                2 => g.binary(BinOp::Mul, lhs, rhs),
                3 => g.binary(BinOp::Div, lhs, rhs),
                4 => g.binary(BinOp::Mod, lhs, rhs),
                5 => g.call("sin", lhs),
                _ => g.delay(lhs),
            };
            ids.push(id);
        }
        let root = *ids.last().unwrap();

        let mut layout = Layout::new();
        let mut out = String::new();
        emit_node(&mut g, root, &mut layout, &mut out);
        prop_assert_eq!(layout.depth(), 0);

        for node in g.nodes() {
            let needle = format!("const float {} =", node.result);
            let count = out.matches(&needle).count();
            if node.generated {
                prop_assert_eq!(count, 1, "{} defined {} times", node.result, count);
            } else {
                prop_assert_eq!(count, 0, "unreached {} was emitted", node.result);
            }
        }

        // A second pass over an already-generated graph is a no-op.
        let len_before = out.len();
        emit_node(&mut g, root, &mut layout, &mut out);
        prop_assert_eq!(out.len(), len_before);
    }

    #[test]
    fn nested_loops_keep_layout_balanced(bounds in prop::collection::vec(1usize..8, 1..6)) {
        let mut g = ExprGraph::new();
        let mut node = g.constant("x", 1.0);
        for end in bounds {
            node = g.repeat(0, end, node);
        }

        let mut layout = Layout::new();
        let mut out = String::new();
        emit_node(&mut g, node, &mut layout, &mut out);
        prop_assert_eq!(layout.depth(), 0);
        prop_assert_eq!(out.matches('{').count(), out.matches('}').count());
    }

    #[test]
    fn builder_output_is_brace_balanced(value in -1000.0f32..1000.0) {
        let mut g = ExprGraph::new();
        let c = g.constant("x", value);
        let d = g.delay(c);
        let cpp = emit_program(&mut g, d, &CodegenOptions::default()).cpp_source;
        prop_assert_eq!(cpp.matches('{').count(), cpp.matches('}').count());
    }
}
