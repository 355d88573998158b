//! The idempotence cache — spec §9 "Idempotence cache for reference
//! expansion".
//!
//! A reference can be reached by more than one path into the same vertex
//! within a single evaluation pass (two fields both embedding the same
//! definition, a comprehension that iterates back over its own parent).
//! Re-folding an already-applied `(vertex, close-id)` pair into the base
//! value would still be correct (unify is idempotent) but wasteful; the
//! cache lets the driver skip conjuncts it has already applied this pass.
//! It's reset every time a vertex re-enters `evaluating`, since a new
//! pass may need to re-apply conjuncts that a prior, abandoned pass
//! already marked seen.

use conflux_model::{CloseId, VertexId};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct IdempotenceCache {
    seen: HashSet<(VertexId, CloseId)>,
}

impl IdempotenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `(vertex, close)` as applied. Returns `true` if this is
    /// the first time it's been seen this pass (the caller should apply
    /// it), `false` if it's already been folded in.
    pub fn mark(&mut self, vertex: VertexId, close: CloseId) -> bool {
        self.seen.insert((vertex, close))
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_is_true_only_on_first_sight() {
        let mut cache = IdempotenceCache::new();
        let v = VertexId::from_raw(0);
        let c = CloseId::from_raw(0);
        assert!(cache.mark(v, c));
        assert!(!cache.mark(v, c));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut cache = IdempotenceCache::new();
        let v = VertexId::from_raw(0);
        let c = CloseId::from_raw(0);
        cache.mark(v, c);
        cache.reset();
        assert!(cache.is_empty());
        assert!(cache.mark(v, c));
    }
}
