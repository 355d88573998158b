//! The environment chain — spec §3 "Environment", §4.D.
//!
//! An [`Environment`] is a cactus-stack frame: it names the vertex whose
//! fields a reference resolves against, an `up` link to the enclosing
//! environment (for lexical scoping of `let` and comprehension bindings),
//! and bookkeeping for cycle detection (`cyclic`, `deref`) and closedness
//! (`close_id`). Environments form a DAG via `up`, never a tree with
//! back-edges, so they're stored in an append-only arena like vertices.

use crate::acceptor::CloseId;
use crate::vertex::VertexId;

/// Index into an [`EnvArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvId(u32);

impl EnvId {
    fn new(idx: usize) -> Self {
        Self(idx.try_into().expect("environment arena overflow"))
    }

    pub fn from_raw(idx: u32) -> Self {
        Self(idx)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single frame in the environment chain.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Environment {
    /// The enclosing environment, for lexical lookups that escape this
    /// vertex (`let` bindings, comprehension iteration variables).
    pub up: Option<EnvId>,
    /// The vertex this environment's conjuncts evaluate field references
    /// against.
    pub vertex: VertexId,
    /// Set when this environment was reached by following a reference
    /// that cycles back to a vertex still on the evaluation stack — see
    /// §4.I cycle handling.
    pub cyclic: bool,
    /// When a reference resolves through structure sharing to a vertex
    /// other than `vertex`, the resolved target is recorded here so
    /// later lookups in the same environment are O(1).
    pub deref: Option<VertexId>,
    /// The closedness acceptor node active when this environment's
    /// conjuncts were inserted — see §4.E, §4.I idempotence cache.
    pub close_id: CloseId,
}

impl Environment {
    pub fn root(vertex: VertexId, close_id: CloseId) -> Self {
        Self {
            up: None,
            vertex,
            cyclic: false,
            deref: None,
            close_id,
        }
    }

    pub fn child(up: EnvId, vertex: VertexId, close_id: CloseId) -> Self {
        Self {
            up: Some(up),
            vertex,
            cyclic: false,
            deref: None,
            close_id,
        }
    }
}

/// Append-only arena of [`Environment`]s, mirroring the vertex arena.
#[derive(Debug, Clone, Default)]
pub struct EnvArena {
    frames: Vec<Environment>,
}

impl EnvArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, env: Environment) -> EnvId {
        let id = EnvId::new(self.frames.len());
        self.frames.push(env);
        id
    }

    pub fn get(&self, id: EnvId) -> &Environment {
        &self.frames[id.index()]
    }

    pub fn get_mut(&mut self, id: EnvId) -> &mut Environment {
        &mut self.frames[id.index()]
    }

    /// Walks `up` links from `id`, yielding `id` first.
    pub fn chain(&self, id: EnvId) -> impl Iterator<Item = EnvId> + '_ {
        std::iter::successors(Some(id), move |&cur| self.frames[cur.index()].up)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::CloseId;
    use crate::vertex::VertexId;

    #[test]
    fn chain_walks_up_links_starting_from_self() {
        let mut arena = EnvArena::new();
        let v = VertexId::from_raw(0);
        let close = CloseId::from_raw(0);
        let root = arena.alloc(Environment::root(v, close));
        let mid = arena.alloc(Environment::child(root, v, close));
        let leaf = arena.alloc(Environment::child(mid, v, close));

        let chain: Vec<EnvId> = arena.chain(leaf).collect();
        assert_eq!(chain, vec![leaf, mid, root]);
    }

    #[test]
    fn deref_starts_unset() {
        let mut arena = EnvArena::new();
        let v = VertexId::from_raw(0);
        let env = arena.alloc(Environment::root(v, CloseId::from_raw(0)));
        assert_eq!(arena.get(env).deref, None);
        arena.get_mut(env).deref = Some(VertexId::from_raw(1));
        assert_eq!(arena.get(env).deref, Some(VertexId::from_raw(1)));
    }
}
