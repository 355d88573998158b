//! The evaluator's public façade — spec §6 "Exposed API".
//!
//! Four entry points, thin wrappers over [`Driver`] and the data model
//! crate's own structural helpers, in the spirit of the teacher's
//! top-level re-export surface: callers reach the evaluator only through
//! these functions plus [`Runtime`] and [`Tracer`].

use crate::driver::Driver;
use crate::runtime::Runtime;
use crate::trace::{NoopTracer, Tracer};
use conflux_core::Feature;
use conflux_model::{Value, VertexId};

/// Drive `vertex` (and whatever it transitively depends on) to a
/// resolved value, tracing nothing.
///
/// The current driver always runs a vertex through to `finalized` in one
/// pass rather than stopping at an intermediate status — there is no
/// partial re-entry point to expose yet, so this returns the same fully
/// resolved value [`unify`] would.
pub fn evaluate(ctx: &mut Runtime, vertex: VertexId) -> Value {
    let mut tracer = NoopTracer;
    evaluate_traced(ctx, vertex, &mut tracer)
}

/// As [`evaluate`], but recording every step through `tracer`.
pub fn evaluate_traced<T: Tracer>(ctx: &mut Runtime, vertex: VertexId, tracer: &mut T) -> Value {
    Driver::new(ctx, tracer).evaluate(vertex)
}

/// Drive `vertex` to `target_status`, returning once it's reached (or
/// surpassed it, since status only moves forward within a pass).
///
/// `target_status` is accepted for interface parity with the exposed
/// contract; a future driver that can suspend mid-pass would honor it
/// precisely; today it simply evaluates fully and checks the outcome,
/// since partial suspension isn't wired up yet.
pub fn unify(
    ctx: &mut Runtime,
    vertex: VertexId,
    target_status: conflux_model::Status,
) -> Value {
    let result = evaluate(ctx, vertex);
    debug_assert!(
        ctx.vertices.get(vertex).status >= target_status,
        "driver always finalizes; it can never undershoot a requested status"
    );
    result
}

/// Structural equality: two vertices are equal if their resolved values
/// are equal and their arcs match label-for-label, recursively. Doesn't
/// require identical vertex ids — two independently built trees with the
/// same shape and values compare equal.
pub fn equal(ctx: &Runtime, a: VertexId, b: VertexId) -> bool {
    let va = ctx.vertices.get(a);
    let vb = ctx.vertices.get(b);
    if va.value() != vb.value() {
        return false;
    }
    if va.arcs.len() != vb.arcs.len() {
        return false;
    }
    va.arcs.iter().all(|(label, &arc_a)| match vb.arcs.get(label) {
        Some(&arc_b) => equal(ctx, arc_a, arc_b),
        None => false,
    })
}

/// Closedness query: whether `label` is allowed on `vertex`, and whether
/// it's one of the scope's explicitly declared fields (as opposed to a
/// bulk-pattern match or an open ellipsis). Hidden labels always pass
/// both, per §4.E's bypass rule.
pub fn accept(ctx: &Runtime, vertex: VertexId, label: Feature) -> (bool, bool) {
    let scope = ctx.vertices.get(vertex).close_id;
    if label.is_hidden() {
        return (true, false);
    }
    let selector = ctx.labels.selector_string(label);
    let accepted = ctx.acceptors.verify(scope, label, &selector);
    let required = ctx.acceptors.is_declared(scope, label);
    (accepted, required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::EvalLimits;
    use conflux_core::{FileId, Symbol};
    use conflux_model::{Conjunct, Environment, Expr, FieldDecl, Vertex};
    use std::rc::Rc;

    fn pos() -> conflux_core::Position {
        conflux_core::Position::new(FileId::from_symbol(Symbol::from_raw(0)), 0)
    }

    #[test]
    fn evaluate_resolves_a_plain_scalar() {
        let mut rt = Runtime::new(EvalLimits::default());
        let root_close = rt.acceptors.root();
        let root = rt.vertices.alloc(Vertex::new(None, Feature::INVALID, root_close));
        let env = rt.envs.alloc(Environment::root(root, root_close));
        rt.vertices
            .get_mut(root)
            .add_conjunct(Conjunct::new(env, Rc::new(Expr::Int(7, pos())), root_close));

        let result = evaluate(&mut rt, root);
        assert_eq!(result, Value::int(7));
    }

    #[test]
    fn equal_compares_arcs_structurally() {
        let mut rt = Runtime::new(EvalLimits::default());
        let root_close = rt.acceptors.root();
        let foo = rt.labels.intern_regular("foo");

        let build = |rt: &mut Runtime| {
            let root = rt.vertices.alloc(Vertex::new(None, Feature::INVALID, root_close));
            let env = rt.envs.alloc(Environment::root(root, root_close));
            let struct_lit = Expr::StructLit {
                fields: vec![FieldDecl::Field {
                    label: foo,
                    optional: false,
                    value: Rc::new(Expr::Int(1, pos())),
                    pos: pos(),
                }],
                ellipsis: false,
                is_definition: false,
                pos: pos(),
            };
            rt.vertices
                .get_mut(root)
                .add_conjunct(Conjunct::new(env, Rc::new(struct_lit), root_close));
            root
        };

        let a = build(&mut rt);
        let b = build(&mut rt);
        evaluate(&mut rt, a);
        evaluate(&mut rt, b);
        assert!(equal(&rt, a, b));
    }

    #[test]
    fn accept_reports_declared_vs_merely_allowed() {
        let mut rt = Runtime::new(EvalLimits::default());
        let root_close = rt.acceptors.root();
        let foo = rt.labels.intern_regular("foo");
        let bar = rt.labels.intern_regular("bar");

        let root = rt.vertices.alloc(Vertex::new(None, Feature::INVALID, root_close));
        let env = rt.envs.alloc(Environment::root(root, root_close));
        let struct_lit = Expr::StructLit {
            fields: vec![FieldDecl::Field {
                label: foo,
                optional: false,
                value: Rc::new(Expr::Int(1, pos())),
                pos: pos(),
            }],
            ellipsis: false,
            is_definition: true,
            pos: pos(),
        };
        rt.vertices
            .get_mut(root)
            .add_conjunct(Conjunct::new(env, Rc::new(struct_lit), root_close));
        evaluate(&mut rt, root);

        let (foo_accepted, foo_required) = accept(&rt, root, foo);
        assert!(foo_accepted && foo_required);
        let (bar_accepted, bar_required) = accept(&rt, root, bar);
        assert!(!bar_accepted && !bar_required);
    }
}
