//! The vertex evaluator driver — spec §4.I.
//!
//! Orchestrates every other component: folds a vertex's conjuncts
//! together with [`conflux_model::unify`], routes struct/list field
//! declarations into child vertices, calls into [`crate::disjunction`]
//! when a conjunct's value is itself a disjunction, calls into
//! [`crate::expand`] for dynamic fields and comprehensions, and tracks
//! status monotonically per [`Status`].
//!
//! Status sequence: `Unprocessed -> Evaluating -> Expanding ->
//! PostDisjunct -> Partial -> EvaluatingArcs -> Finalized`. A vertex may
//! be asked to evaluate again while `Partial` (a sibling needs its value
//! before it's fully done); re-entering `Evaluating` from `Partial` is
//! the one sanctioned "backward" step, handled by [`Vertex::advance`]
//! only ever being called forward *within one pass* — a fresh pass resets
//! status to `Evaluating` explicitly rather than calling `advance`.

use crate::cache::IdempotenceCache;
use crate::disjunction::unify_disjunctions;
use crate::expand::{run_fixed_point, Expander, ExpansionOutcome};
use crate::runtime::Runtime;
use crate::trace::Tracer;
use conflux_core::Feature;
use conflux_model::{
    unify, Bottom, BottomCode, CloseId, Conjunct, EnvId, Environment, Expr, FieldDecl, Literal,
    ListOpenness, Status, Value, Vertex, VertexId,
};
use std::rc::Rc;

/// Drives one vertex (and transitively, the vertices it depends on) to a
/// final value. Borrows the [`Runtime`]'s arenas and a [`Tracer`] for the
/// whole pass.
pub struct Driver<'a, T: Tracer> {
    runtime: &'a mut Runtime,
    tracer: &'a mut T,
    cache: IdempotenceCache,
    /// Vertices currently on the call stack, for reference/structural
    /// cycle detection.
    stack: Vec<VertexId>,
}

impl<'a, T: Tracer> Driver<'a, T> {
    pub fn new(runtime: &'a mut Runtime, tracer: &'a mut T) -> Self {
        Self {
            runtime,
            tracer,
            cache: IdempotenceCache::new(),
            stack: Vec::new(),
        }
    }

    /// Evaluate `vertex` to a final value, recursing into its arcs.
    /// Idempotent: calling this again on an already-`Finalized` vertex
    /// just returns its cached value.
    pub fn evaluate(&mut self, vertex: VertexId) -> Value {
        if self.runtime.vertices.get(vertex).status == Status::Finalized {
            return self.runtime.vertices.get(vertex).value();
        }

        if self.stack.contains(&vertex) {
            // A vertex referring back to itself while still on the
            // stack is a cycle. Whether it's fatal depends on whether
            // anything else about it resolved without going through the
            // cycle (has_non_cycle) — see the reconciliation at the end
            // of this function.
            self.runtime.vertices.get_mut(vertex).has_cycle = true;
            return Value::Bottom(Bottom::reference_cycle(
                "reference cycle detected while evaluating this vertex",
            ));
        }

        self.stack.push(vertex);
        self.set_status(vertex, Status::Evaluating);
        self.cache.reset();

        let selector = self.runtime.labels.selector_string(self.runtime.vertices.get(vertex).label);
        self.tracer.enter_vertex(vertex, &selector);

        let folded = self.fold_conjuncts(vertex);

        self.set_status(vertex, Status::Expanding);
        // Struct/list literal conjuncts (and the dynamic fields/`for`
        // comprehensions nested inside them) are expanded directly in
        // `fold_conjuncts`/`expand_struct_fields` below — dynamic labels
        // specifically go through `crate::expand::run_fixed_point` there,
        // since only a field's own struct literal knows the sibling arcs
        // its label expression might depend on.

        self.set_status(vertex, Status::PostDisjunct);
        let resolved = if matches!(folded, Value::Disjunction(..)) {
            // Resolving a lone disjunction through the engine still
            // collapses it down to its default(s) even when nothing else
            // unified with it.
            match unify_disjunctions(&folded, &Value::Top, &self.runtime.limits) {
                Ok(v) => v,
                Err(bottom) => Value::Bottom(bottom),
            }
        } else {
            folded
        };

        self.set_status(vertex, Status::Partial);
        self.runtime.vertices.get_mut(vertex).base_value = Some(resolved.clone());

        self.set_status(vertex, Status::EvaluatingArcs);
        let arc_ids: Vec<VertexId> = self
            .runtime
            .vertices
            .get(vertex)
            .arcs
            .values()
            .copied()
            .collect();
        for arc in arc_ids {
            self.evaluate(arc);
        }

        self.stack.pop();

        let v = self.runtime.vertices.get_mut(vertex);
        let final_value = if v.has_cycle && !v.has_non_cycle && matches!(resolved, Value::Bottom(_)) {
            resolved
        } else if v.has_cycle && !v.has_non_cycle {
            // Every conjunct ran through a cycle and nothing independent
            // resolved it: a genuine structural cycle, not a harmless
            // reference loop that something else broke.
            Value::Bottom(Bottom::structural_cycle(
                "vertex has no conjunct that resolves without cycling back to itself",
            ))
        } else {
            resolved
        };
        v.base_value = Some(final_value.clone());
        v.status = Status::Finalized;
        if let Value::Bottom(b) = &final_value {
            self.tracer.conflict(vertex, b);
        }
        final_value
    }

    fn set_status(&mut self, vertex: VertexId, status: Status) {
        let v = self.runtime.vertices.get_mut(vertex);
        let from = v.status;
        if status >= from {
            v.status = status;
            self.tracer.status_change(vertex, from, status);
        }
    }

    /// Fold every conjunct on `vertex` together with [`unify`], routing
    /// struct/list fields into child arcs as they're discovered and
    /// skipping any `(vertex, close_id)` pair already applied this pass.
    fn fold_conjuncts(&mut self, vertex: VertexId) -> Value {
        let conjuncts = self.runtime.vertices.get(vertex).conjuncts.clone();
        let mut acc = Value::Top;
        let mut any_resolved_without_cycle = false;

        for (idx, conjunct) in conjuncts.iter().enumerate() {
            if !self.cache.mark(vertex, conjunct.close_id) {
                continue;
            }
            let value = self.eval_expr(vertex, conjunct);
            if !matches!(value, Value::Bottom(Bottom { code: conflux_model::BottomCode::ReferenceCycle, .. })) {
                any_resolved_without_cycle = true;
            }
            acc = unify(&acc, &value);
            self.tracer.conjunct_applied(vertex, idx);
            if acc.is_bottom() {
                break;
            }
        }

        if any_resolved_without_cycle {
            self.runtime.vertices.get_mut(vertex).has_non_cycle = true;
        }
        acc
    }

    /// Evaluate one conjunct's expression down to a [`Value`], expanding
    /// struct/list literals into child arcs in the process. References
    /// (`FieldRef`/`Selector`/`Index`), `let`/`if`/`for`, and string
    /// interpolation all resolve here by walking the environment chain
    /// (§4.D) via [`Driver::resolve_to_vertex`].
    fn eval_expr(&mut self, vertex: VertexId, conjunct: &Conjunct) -> Value {
        match conjunct.expr.as_ref() {
            Expr::Null(_) => Value::Scalar(conflux_model::Literal::Null),
            Expr::Bool(b, _) => Value::bool(*b),
            Expr::Int(n, _) => Value::int(*n),
            Expr::Float(f, _) => Value::float(*f),
            Expr::Str(s, _) => Value::string(s.clone()),
            Expr::Bytes(b, _) => Value::Scalar(conflux_model::Literal::Bytes(b.clone())),
            Expr::BasicType(k, _) => Value::BasicType(*k),
            Expr::Top(_) => Value::Top,
            Expr::BottomLit(pos) => {
                Value::Bottom(Bottom::user_error("explicit bottom literal").with_position(*pos))
            }
            Expr::Bound { op, operand, pos } => {
                let inner = self.eval_subexpr(vertex, conjunct, operand);
                Value::Bound(*op, Box::new(inner)).tap_err(*pos)
            }
            Expr::Call { builtin, .. } => Value::Validator(builtin.clone()),
            Expr::Unary { op, operand, pos } => {
                let inner = self.eval_subexpr(vertex, conjunct, operand);
                match (op, &inner) {
                    (conflux_model::UnaryOp::Neg, Value::Scalar(conflux_model::Literal::Int(n))) => {
                        Value::int(-n)
                    }
                    (conflux_model::UnaryOp::Neg, Value::Scalar(conflux_model::Literal::Float(f))) => {
                        Value::float(-f)
                    }
                    (conflux_model::UnaryOp::Not, Value::Scalar(conflux_model::Literal::Bool(b))) => {
                        Value::bool(!b)
                    }
                    _ => Value::Bottom(Bottom::eval_error("unary operator not defined for operand").with_position(*pos)),
                }
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let l = self.eval_subexpr(vertex, conjunct, lhs);
                let r = self.eval_subexpr(vertex, conjunct, rhs);
                conflux_model::binop(*op, &l, &r)
            }
            Expr::Disjunction { terms, num_defaults, .. } => {
                let values: Vec<Value> = terms
                    .iter()
                    .map(|t| self.eval_subexpr(vertex, conjunct, t))
                    .collect();
                Value::Disjunction(values, *num_defaults)
            }
            Expr::ListLit { elems, ellipsis, .. } => {
                for (i, elem) in elems.iter().enumerate() {
                    let label = Feature::integer(i as u32);
                    let child = self.runtime.vertices.get(vertex).get_arc(label);
                    let child = child.unwrap_or_else(|| {
                        let id = self.runtime.vertices.alloc(Vertex::new(
                            Some(vertex),
                            label,
                            conjunct.close_id,
                        ));
                        self.runtime.vertices.get_mut(vertex).arcs.insert(label, id);
                        id
                    });
                    self.runtime.vertices.get_mut(child).add_conjunct(Conjunct::new(
                        conjunct.env,
                        elem.clone(),
                        conjunct.close_id,
                    ));
                }
                Value::ListMarker(if *ellipsis {
                    ListOpenness::Open
                } else {
                    ListOpenness::Closed
                })
            }
            Expr::StructLit { fields, ellipsis, is_definition, .. } => {
                self.expand_struct_fields(vertex, conjunct, fields, *ellipsis, *is_definition)
            }
            Expr::Embedding { expr, .. } => self.eval_subexpr(vertex, conjunct, expr),
            Expr::FieldRef { .. } | Expr::Selector { .. } | Expr::Index { .. } => {
                match self.resolve_to_vertex(vertex, conjunct, conjunct.expr.as_ref()) {
                    Ok(target) => self.evaluate(target),
                    Err(bottom) => Value::Bottom(bottom),
                }
            }
            Expr::Let { name, value, body, .. } => {
                // Bind `name` to `value`'s result on a one-off vertex
                // labeled with the hidden feature sharing `name`'s symbol,
                // then push it onto the environment chain for `body` to
                // resolve through like any other in-scope field.
                let binding = self.runtime.vertices.alloc(Vertex::new(
                    None,
                    Feature::from_hidden_symbol(*name),
                    conjunct.close_id,
                ));
                self.runtime.vertices.get_mut(binding).add_conjunct(Conjunct::new(
                    conjunct.env,
                    value.clone(),
                    conjunct.close_id,
                ));
                self.evaluate(binding);
                let let_env = self
                    .runtime
                    .envs
                    .alloc(Environment::child(conjunct.env, binding, conjunct.close_id));
                let body_conjunct = Conjunct::new(let_env, body.clone(), conjunct.close_id);
                self.eval_expr(vertex, &body_conjunct)
            }
            Expr::If { cond, body, pos } => match self.eval_subexpr(vertex, conjunct, cond) {
                Value::Scalar(Literal::Bool(true)) => self.eval_subexpr(vertex, conjunct, body),
                // A false condition contributes nothing — identity for
                // unification, not a rejection of the enclosing struct.
                Value::Scalar(Literal::Bool(false)) => Value::Top,
                b @ Value::Bottom(_) => b,
                _ => Value::Bottom(
                    Bottom::eval_error("if condition must evaluate to a boolean").with_position(*pos),
                ),
            },
            Expr::For { key, value, source, body, pos } => {
                self.eval_for(vertex, conjunct, key.as_ref(), *value, source, body, *pos)
            }
            Expr::Interpolation { parts, pos } => self.eval_interpolation(vertex, conjunct, parts, *pos),
        }
    }

    /// Resolve a [`Expr::FieldRef`]/[`Expr::Selector`]/[`Expr::Index`] to
    /// the [`VertexId`] it names, walking `conjunct.env`'s chain outward
    /// (§4.D) for a plain reference, or recursing into `base` first for a
    /// selector/index. Doesn't evaluate the resolved vertex itself —
    /// callers decide whether they need its value or just its identity
    /// (e.g. `for`'s source, which only needs the arc list).
    fn resolve_to_vertex(
        &mut self,
        vertex: VertexId,
        conjunct: &Conjunct,
        expr: &Expr,
    ) -> Result<VertexId, Bottom> {
        match expr {
            Expr::FieldRef { name, pos } => {
                let chain: Vec<EnvId> = self.runtime.envs.chain(conjunct.env).collect();
                for env_id in chain {
                    let env = self.runtime.envs.get(env_id);
                    let base_vertex = env.vertex;
                    // `Feature::INVALID` is the placeholder label given to
                    // root vertices, never a real binding — only hidden
                    // lexical bindings (`let`/`for`) get a self-match here.
                    if !name.is_invalid() && self.runtime.vertices.get(base_vertex).label == *name {
                        return Ok(base_vertex);
                    }
                    if let Some(child) = self.runtime.vertices.get(base_vertex).get_arc(*name) {
                        return Ok(child);
                    }
                }
                let selector = self.runtime.labels.selector_string(*name);
                Err(Bottom::incomplete(format!("reference to undefined field {selector}"))
                    .with_position(*pos))
            }
            Expr::Selector { base, field, pos } => {
                let base_vertex = self.resolve_to_vertex(vertex, conjunct, base)?;
                self.evaluate(base_vertex);
                self.runtime.vertices.get(base_vertex).get_arc(*field).ok_or_else(|| {
                    let selector = self.runtime.labels.selector_string(*field);
                    Bottom::eval_error(format!("selected field {selector} does not exist"))
                        .with_position(*pos)
                })
            }
            Expr::Index { base, index, pos } => {
                let base_vertex = self.resolve_to_vertex(vertex, conjunct, base)?;
                self.evaluate(base_vertex);
                let idx_value = self.eval_subexpr(vertex, conjunct, index);
                let label = match idx_value {
                    Value::Scalar(Literal::Int(n)) => Feature::integer(n as u32),
                    Value::Scalar(Literal::Str(s)) => self.runtime.labels.intern_regular(&s),
                    Value::Bottom(b) => return Err(b),
                    _ => {
                        return Err(Bottom::eval_error("index must be an integer or a string")
                            .with_position(*pos))
                    }
                };
                self.runtime.vertices.get(base_vertex).get_arc(label).ok_or_else(|| {
                    Bottom::eval_error("index out of range or field not found").with_position(*pos)
                })
            }
            other => Err(Bottom::incomplete("expression does not resolve to a referenceable vertex")
                .with_position(other.pos())),
        }
    }

    /// `for key, value in source { body }` — iterates `source`'s already-
    /// expanded arcs, binding `key`/`value` as hidden-feature vertices
    /// per iteration and re-evaluating `body` against the *same* `vertex`
    /// as the enclosing struct so a struct-literal body routes its fields
    /// onto the comprehension's host the same way a plain embedding does.
    #[allow(clippy::too_many_arguments)]
    fn eval_for(
        &mut self,
        vertex: VertexId,
        conjunct: &Conjunct,
        key: Option<&conflux_core::Symbol>,
        value_name: conflux_core::Symbol,
        source: &Expr,
        body: &Rc<Expr>,
        pos: conflux_core::Position,
    ) -> Value {
        let source_vertex = match self.resolve_to_vertex(vertex, conjunct, source) {
            Ok(v) => v,
            Err(b) => return Value::Bottom(b),
        };
        self.evaluate(source_vertex);
        let arcs: Vec<(Feature, VertexId)> = self
            .runtime
            .vertices
            .get(source_vertex)
            .arcs
            .iter()
            .map(|(&f, &v)| (f, v))
            .collect();
        if arcs.is_empty() {
            return Value::Top;
        }

        let mut acc = Value::Top;
        for (label, item_vertex) in arcs {
            let item_value = self.evaluate(item_vertex);
            if item_value.is_bottom() {
                return item_value;
            }

            let mut iter_env = conjunct.env;
            if let Some(key_sym) = key {
                let key_vertex = self.runtime.vertices.alloc(Vertex::new(
                    None,
                    Feature::from_hidden_symbol(*key_sym),
                    conjunct.close_id,
                ));
                let selector = self.runtime.labels.selector_string(label);
                let kv = self.runtime.vertices.get_mut(key_vertex);
                kv.base_value = Some(Value::string(selector));
                kv.status = Status::Finalized;
                iter_env = self
                    .runtime
                    .envs
                    .alloc(Environment::child(iter_env, key_vertex, conjunct.close_id));
            }
            let value_vertex = self.runtime.vertices.alloc(Vertex::new(
                None,
                Feature::from_hidden_symbol(value_name),
                conjunct.close_id,
            ));
            let vv = self.runtime.vertices.get_mut(value_vertex);
            vv.base_value = Some(item_value);
            vv.status = Status::Finalized;
            iter_env = self
                .runtime
                .envs
                .alloc(Environment::child(iter_env, value_vertex, conjunct.close_id));

            let body_conjunct = Conjunct::new(iter_env, body.clone(), conjunct.close_id);
            let v = self.eval_expr(vertex, &body_conjunct);
            acc = unify(&acc, &v);
            if acc.is_bottom() {
                return acc.tap_err(pos);
            }
        }
        acc
    }

    fn eval_interpolation(
        &mut self,
        vertex: VertexId,
        conjunct: &Conjunct,
        parts: &[conflux_model::InterpPart],
        pos: conflux_core::Position,
    ) -> Value {
        let mut out = String::new();
        for part in parts {
            match part {
                conflux_model::InterpPart::Lit(s) => out.push_str(s),
                conflux_model::InterpPart::Expr(e) => match self.eval_subexpr(vertex, conjunct, e) {
                    Value::Scalar(Literal::Str(s)) => out.push_str(&s),
                    Value::Scalar(Literal::Int(n)) => out.push_str(&n.to_string()),
                    Value::Scalar(Literal::Float(f)) => out.push_str(&f.to_string()),
                    Value::Scalar(Literal::Bool(b)) => out.push_str(&b.to_string()),
                    Value::Scalar(Literal::Null) => out.push_str("null"),
                    b @ Value::Bottom(_) => return b,
                    _ => {
                        return Value::Bottom(
                            Bottom::eval_error("interpolation part did not resolve to a scalar")
                                .with_position(pos),
                        )
                    }
                },
            }
        }
        Value::string(out)
    }

    fn eval_subexpr(&mut self, vertex: VertexId, conjunct: &Conjunct, expr: &Rc<Expr>) -> Value {
        let sub = Conjunct::new(conjunct.env, expr.clone(), conjunct.close_id);
        self.eval_expr(vertex, &sub)
    }

    /// Route a struct literal's fields into child arcs, building/merging
    /// the closedness fieldset for this scope as declarations arrive —
    /// order-independent per §4.F, since [`conflux_model::FieldSet`]'s
    /// mutators are all set unions.
    ///
    /// This literal gets its own closedness scope (`own_scope`), isolated
    /// from whatever scope its parent passed in — an embedding discovered
    /// here must close only this struct, not leak into `conjunct.close_id`
    /// and everything else that shares it. The scope only grows a ring
    /// (closes) when this literal is itself a definition body, or when it
    /// embeds something that turned out closed — a plain struct with
    /// declared fields stays open, matching the glossary's notion of
    /// definition as the thing that imposes an upper bound, not mere field
    /// declaration. Field acceptance is checked in a second pass, once
    /// `own_scope`'s ring (if any) is fully built, so the result doesn't
    /// depend on the declarations' textual order. Dynamic field labels
    /// are collected during the first pass and resolved afterward through
    /// [`crate::expand::run_fixed_point`], since a label expression may
    /// depend on a sibling field this same pass just routed.
    fn expand_struct_fields(
        &mut self,
        vertex: VertexId,
        conjunct: &Conjunct,
        fields: &[FieldDecl],
        ellipsis: bool,
        is_definition: bool,
    ) -> Value {
        let own_scope = self.runtime.acceptors.insert_subtree(conjunct.close_id);
        let mut field_set = conflux_model::FieldSet::new();
        if ellipsis {
            field_set.insert_ellipsis();
        }
        let mut embedded_closed = false;
        let mut declared_fields: Vec<Feature> = Vec::new();
        let mut pending_dynamic: Vec<DynamicFieldItem> = Vec::new();

        for decl in fields {
            match decl {
                FieldDecl::Field { label, value, .. } => {
                    field_set.insert_declared(*label);
                    declared_fields.push(*label);
                    // Create the arc and attach its conjunct immediately
                    // (before any later embedding in this same literal
                    // evaluates) so a sibling reference — including one
                    // reached through a `for`/`if` embedded right after
                    // this field — finds it already in place. Whether the
                    // field is actually *allowed* is still checked only
                    // once `own_scope`'s ring is fully built, below.
                    self.add_field_conjunct(vertex, conjunct.env, own_scope, *label, value.clone());
                    // Match-and-insert, forward direction: a bulk pattern
                    // declared earlier in this same literal also applies
                    // to this field (§4.F).
                    let selector = self.runtime.labels.selector_string(*label);
                    let matches: Vec<Rc<Expr>> =
                        field_set.matching_bulk_values(&selector).cloned().collect();
                    for bulk_value in matches {
                        self.add_field_conjunct(vertex, conjunct.env, own_scope, *label, bulk_value);
                    }
                }
                FieldDecl::BulkOptional { pattern, value, .. } => {
                    if let Expr::Str(text, _) = pattern.as_ref() {
                        field_set.insert_bulk(text.clone(), value.clone());
                        // Match-and-insert, backward direction: apply to
                        // every field already routed onto this vertex.
                        self.apply_bulk_pattern_to_existing_arcs(vertex, conjunct.env, own_scope, text, value);
                    }
                }
                FieldDecl::Dynamic { label_expr, value, .. } => {
                    // The label itself may reference a sibling field not
                    // yet routed (e.g. `(x): v` where `x` is declared
                    // later in this same literal), so it can't always
                    // resolve on the first attempt — hand it to the
                    // fixed-point expander (§4.H) rather than failing
                    // immediately on `Bottom::incomplete`.
                    pending_dynamic.push(DynamicFieldItem {
                        label_expr: label_expr.clone(),
                        value: value.clone(),
                    });
                }
                FieldDecl::Embedding { expr, .. } => {
                    let embed_close = self.runtime.acceptors.insert_embed(own_scope);
                    let embedded = Conjunct::new(conjunct.env, expr.clone(), embed_close);
                    let v = self.eval_expr(vertex, &embedded);
                    if self.runtime.acceptors.is_closed(embed_close) {
                        embedded_closed = true;
                    }
                    let current = self.runtime.vertices.get(vertex).value();
                    let merged = unify(&current, &v);
                    self.runtime.vertices.get_mut(vertex).base_value = Some(merged);
                }
                FieldDecl::Let { .. } => {
                    // `let` bindings extend the environment chain rather
                    // than contribute a value; handled by environment
                    // construction, not here.
                }
            }
        }

        let mut dynamic_failure: Option<Bottom> = None;
        if !pending_dynamic.is_empty() {
            let max_rounds = self.runtime.limits.max_comprehension_rounds;
            let mut expander = DynamicExpander {
                driver: self,
                vertex,
                env: conjunct.env,
                scope: own_scope,
                resolved_labels: Vec::new(),
            };
            match run_fixed_point(&mut expander, pending_dynamic, max_rounds) {
                Ok(_) => {
                    for label in expander.resolved_labels {
                        field_set.insert_declared(label);
                        declared_fields.push(label);
                    }
                }
                Err(bottom) => dynamic_failure = Some(bottom),
            }
        }

        if is_definition || embedded_closed {
            self.runtime.acceptors.insert_definition(own_scope, field_set);
        }
        self.runtime.vertices.get_mut(vertex).close_id = own_scope;
        self.runtime.vertices.get_mut(vertex).closed = self.runtime.acceptors.is_closed(own_scope);

        let mut rejected: Option<Bottom> = dynamic_failure;
        for label in declared_fields {
            if let Some(bottom) = self.check_field_allowed(own_scope, label) {
                rejected.get_or_insert(bottom);
            }
        }

        match rejected {
            Some(bottom) => Value::Bottom(bottom),
            None => Value::StructMarker,
        }
    }

    /// Create (or reuse) `label`'s arc on `vertex` and attach `value` as
    /// one more conjunct on it. Doesn't check closedness — callers that
    /// need the accept/reject decision call [`Driver::check_field_allowed`]
    /// separately, once the enclosing scope's ring is fully built.
    fn add_field_conjunct(
        &mut self,
        vertex: VertexId,
        env: EnvId,
        scope: CloseId,
        label: Feature,
        value: Rc<Expr>,
    ) {
        let child = self.runtime.vertices.get(vertex).get_arc(label);
        let child = child.unwrap_or_else(|| {
            let id = self
                .runtime
                .vertices
                .alloc(Vertex::new(Some(vertex), label, scope));
            self.runtime.vertices.get_mut(vertex).arcs.insert(label, id);
            id
        });
        self.runtime
            .vertices
            .get_mut(child)
            .add_conjunct(Conjunct::new(env, value, scope));
    }

    /// Whether `label` is allowed in `scope`, as a [`Bottom`] the caller
    /// folds into the struct's own value like any other conflict.
    fn check_field_allowed(&mut self, scope: CloseId, label: Feature) -> Option<Bottom> {
        let selector = self.runtime.labels.selector_string(label);
        if !label.is_hidden() && !self.runtime.acceptors.verify(scope, label, &selector) {
            return Some(Bottom::eval_error(format!(
                "field {selector} not allowed by closed struct"
            )));
        }
        None
    }

    /// `match-and-insert` (§4.F), backward direction: a newly declared
    /// `[pattern]: value` bulk-optional field must apply its conjunct to
    /// every arc already present that matches `pattern`, not just ones
    /// created afterward — this is what keeps `{[string]: T, foo: U}` and
    /// `{foo: U, [string]: T}` equivalent regardless of which is written
    /// first. The forward direction (pattern declared before the field)
    /// is handled where `FieldDecl::Field` is routed, above.
    fn apply_bulk_pattern_to_existing_arcs(
        &mut self,
        vertex: VertexId,
        env: EnvId,
        scope: CloseId,
        text: &str,
        value: &Rc<Expr>,
    ) {
        // The value conjunct is evaluated in the environment where the
        // pattern itself was declared, not wherever the matching field's
        // own value happens to live.
        let matching: Vec<Feature> = self
            .runtime
            .vertices
            .get(vertex)
            .arcs
            .keys()
            .copied()
            .filter(|&label| {
                let selector = self.runtime.labels.selector_string(label);
                conflux_model::pattern_matches_selector(text, &selector)
            })
            .collect();
        for label in matching {
            self.add_field_conjunct(vertex, env, scope, label, value.clone());
        }
    }
}

/// One `(expr): value` dynamic field still waiting on its label to
/// resolve.
struct DynamicFieldItem {
    label_expr: Rc<Expr>,
    value: Rc<Expr>,
}

/// Drives [`DynamicFieldItem`]s through [`run_fixed_point`]: each round,
/// re-attempt the label expression and route the field the moment it
/// resolves to a string. Borrows the driver for the duration of one
/// `expand_struct_fields` call, scoped to a single vertex/environment/
/// closedness-scope triple.
struct DynamicExpander<'d, 'a, T: Tracer> {
    driver: &'d mut Driver<'a, T>,
    vertex: VertexId,
    env: EnvId,
    scope: CloseId,
    resolved_labels: Vec<Feature>,
}

impl<'d, 'a, T: Tracer> Expander for DynamicExpander<'d, 'a, T> {
    type Item = DynamicFieldItem;

    fn try_resolve(&mut self, item: &DynamicFieldItem) -> ExpansionOutcome {
        let probe = Conjunct::new(self.env, item.label_expr.clone(), self.scope);
        let label_value = self.driver.eval_subexpr(self.vertex, &probe, &item.label_expr);
        match label_value {
            Value::Bottom(b) if b.code == BottomCode::Incomplete => ExpansionOutcome::Blocked,
            Value::Bottom(b) => ExpansionOutcome::Failed(b),
            Value::Scalar(Literal::Str(s)) => {
                let label = self.driver.runtime.labels.intern_regular(&s);
                self.driver
                    .add_field_conjunct(self.vertex, self.env, self.scope, label, item.value.clone());
                self.resolved_labels.push(label);
                ExpansionOutcome::Resolved(Vec::new())
            }
            _ => ExpansionOutcome::Failed(Bottom::eval_error(
                "dynamic field label must evaluate to a string",
            )),
        }
    }
}

/// Small helper used above to keep `Bound` construction terse while
/// still letting a malformed operand collapse directly to a positioned
/// bottom instead of a `Bound` that will never usefully simplify.
trait TapErr {
    fn tap_err(self, pos: conflux_core::Position) -> Value;
}

impl TapErr for Value {
    fn tap_err(self, pos: conflux_core::Position) -> Value {
        match self {
            Value::Bottom(b) => Value::Bottom(b.with_position(pos)),
            other => other,
        }
    }
}
