//! The vertex and arc store — spec §3 "Vertex", §4.C, invariant 3 (arc
//! order is insertion order, not sorted).
//!
//! A [`Vertex`] is one node in the evaluation graph: a struct field, a
//! list element, or the document root. It owns the conjuncts that
//! contribute to it, the arcs (child vertices) it has already expanded,
//! and the running [`crate::value::Value`] those conjuncts unify down to.
//! Arcs are stored in an [`indexmap::IndexMap`] so iteration order always
//! matches first-declaration order, regardless of which conjunct supplied
//! a given field first.

use crate::acceptor::CloseId;
use crate::conjunct::Conjunct;
use crate::value::Value;
use conflux_core::Feature;
use indexmap::IndexMap;

/// Index into a [`VertexArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexId(u32);

impl VertexId {
    pub fn from_raw(idx: u32) -> Self {
        Self(idx)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The vertex evaluator's state machine — spec §4.I. Status is monotonic:
/// a vertex never regresses to an earlier stage within one evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Unprocessed,
    Evaluating,
    Expanding,
    PostDisjunct,
    Partial,
    EvaluatingArcs,
    Finalized,
}

/// A vertex in the evaluation graph.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub parent: Option<VertexId>,
    pub label: Feature,
    pub status: Status,
    pub conjuncts: Vec<Conjunct>,
    pub arcs: IndexMap<Feature, VertexId>,
    /// The accumulated scalar/struct-marker/list-marker value, once any
    /// conjuncts have been folded. `None` until the first fold.
    pub base_value: Option<Value>,
    pub close_id: CloseId,
    /// Whether this vertex closes off its own arcs to exactly its
    /// fieldset (set once a definition conjunct contributes here).
    pub closed: bool,
    /// Set when a reference cycle through this vertex was detected but a
    /// non-cyclic conjunct might still resolve it (§4.I cycle handling).
    pub has_cycle: bool,
    /// Set once at least one conjunct resolved without going through a
    /// cycle — lets the driver distinguish "genuinely unresolvable cycle"
    /// from "cyclic reference alongside an unrelated concrete conjunct".
    pub has_non_cycle: bool,
}

impl Vertex {
    pub fn new(parent: Option<VertexId>, label: Feature, close_id: CloseId) -> Self {
        Self {
            parent,
            label,
            status: Status::Unprocessed,
            conjuncts: Vec::new(),
            arcs: IndexMap::new(),
            base_value: None,
            close_id,
            closed: false,
            has_cycle: false,
            has_non_cycle: false,
        }
    }

    pub fn add_conjunct(&mut self, c: Conjunct) {
        self.conjuncts.push(c);
    }

    /// Get or create the arc for `label`, preserving the order arcs were
    /// first requested in (insertion order), not label order.
    pub fn get_or_create_arc(
        &mut self,
        label: Feature,
        make: impl FnOnce() -> VertexId,
    ) -> VertexId {
        *self.arcs.entry(label).or_insert_with(make)
    }

    pub fn get_arc(&self, label: Feature) -> Option<VertexId> {
        self.arcs.get(&label).copied()
    }

    pub fn value(&self) -> Value {
        self.base_value.clone().unwrap_or(Value::Top)
    }

    /// Advance status forward only — a no-op (in debug, a panic) if asked
    /// to move backward, enforcing the monotonicity invariant.
    pub fn advance(&mut self, next: Status) {
        debug_assert!(
            next >= self.status,
            "vertex status must not regress: {:?} -> {:?}",
            self.status,
            next
        );
        self.status = next;
    }
}

/// Append-only arena of vertices. Vertices reference each other only by
/// [`VertexId`], so the graph can be cyclic without Rust ownership cycles.
#[derive(Debug, Clone, Default)]
pub struct VertexArena {
    vertices: Vec<Vertex>,
}

impl VertexArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(
            self.vertices
                .len()
                .try_into()
                .expect("vertex arena overflow"),
        );
        self.vertices.push(vertex);
        id
    }

    pub fn get(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn get_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::CloseId;

    #[test]
    fn arcs_preserve_first_request_order_not_label_order() {
        let mut v = Vertex::new(None, Feature::INVALID, CloseId::from_raw(0));
        let b = Feature::integer(2);
        let a = Feature::integer(1);
        v.get_or_create_arc(b, || VertexId::from_raw(10));
        v.get_or_create_arc(a, || VertexId::from_raw(11));
        let order: Vec<Feature> = v.arcs.keys().copied().collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn get_or_create_arc_is_idempotent() {
        let mut v = Vertex::new(None, Feature::INVALID, CloseId::from_raw(0));
        let f = Feature::integer(1);
        let first = v.get_or_create_arc(f, || VertexId::from_raw(5));
        let second = v.get_or_create_arc(f, || VertexId::from_raw(99));
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "must not regress")]
    fn advance_rejects_backward_transitions() {
        let mut v = Vertex::new(None, Feature::INVALID, CloseId::from_raw(0));
        v.advance(Status::Finalized);
        v.advance(Status::Evaluating);
    }

    #[test]
    fn default_value_is_top() {
        let v = Vertex::new(None, Feature::INVALID, CloseId::from_raw(0));
        assert_eq!(v.value(), Value::Top);
    }
}
