//! The closedness acceptor canopy — spec §3 "Closedness acceptor", §4.E.
//!
//! Every vertex that descends from a definition carries a [`CloseId`]
//! pointing into this canopy. A node is either:
//! - an **AND-ring**: one or more [`FieldSet`]s contributed by definitions
//!   unified at this vertex. A field is allowed if *any* ring member
//!   allows it (unifying two closed structs allows the union of their
//!   fields, not the intersection).
//! - **open**: no ring at all — an ordinary (non-definition) struct.
//!
//! Embedding is a separate, additive list: an embedded struct's fields
//! bypass this node's ring even if the ring itself would reject them
//! (embedding a literal struct into a closed definition widens it for
//! that subtree). Hidden fields bypass closedness entirely regardless of
//! rings or embedding — that's a property of the [`Feature`], checked by
//! the caller, not encoded here.

use crate::fieldset::FieldSet;
use conflux_core::Feature;
use std::collections::HashMap;

/// Index into a [`CloseArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloseId(u32);

impl CloseId {
    pub fn from_raw(idx: u32) -> Self {
        Self(idx)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct AcceptorNode {
    parent: Option<CloseId>,
    rings: Vec<FieldSet>,
    embedded: Vec<CloseId>,
}

impl AcceptorNode {
    fn open(parent: Option<CloseId>) -> Self {
        Self {
            parent,
            rings: Vec::new(),
            embedded: Vec::new(),
        }
    }
}

/// Append-only arena of acceptor nodes, one per distinct closedness scope
/// reached during evaluation.
#[derive(Debug, Clone, Default)]
pub struct CloseArena {
    nodes: Vec<AcceptorNode>,
}

impl CloseArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root scope: open, no enclosing definition.
    pub fn root(&mut self) -> CloseId {
        self.alloc(AcceptorNode::open(None))
    }

    fn alloc(&mut self, node: AcceptorNode) -> CloseId {
        let id = CloseId(self.nodes.len().try_into().expect("acceptor arena overflow"));
        self.nodes.push(node);
        id
    }

    /// A definition (`#Foo: {...}`) unified at `parent`'s scope adds
    /// `fields` as a new AND-ring member. Returns the (possibly new)
    /// scope conjuncts under this definition should use.
    pub fn insert_definition(&mut self, parent: CloseId, fields: FieldSet) -> CloseId {
        self.nodes[parent.index()].rings.push(fields);
        parent
    }

    /// An embedding (`{...}` spliced into a closed struct) opens a new
    /// child scope whose fields bypass `parent`'s ring.
    pub fn insert_embed(&mut self, parent: CloseId) -> CloseId {
        let child = self.alloc(AcceptorNode::open(Some(parent)));
        self.nodes[parent.index()].embedded.push(child);
        child
    }

    /// A nested struct literal's own closedness scope: a fresh, initially
    /// open node parented to `parent`. Isolating each struct literal this
    /// way keeps an embedding or definition discovered deeper in the tree
    /// from leaking into `parent`'s own ring/embedded lists — siblings
    /// that share `parent` must not be affected by what one of them
    /// embeds. `compact` reclaims the ones that turn out to stay open.
    pub fn insert_subtree(&mut self, parent: CloseId) -> CloseId {
        self.alloc(AcceptorNode::open(Some(parent)))
    }

    /// Whether `feature` is allowed in `scope`, given its displayed form
    /// `selector` (for pattern matching). Hidden-field bypass is the
    /// caller's responsibility.
    pub fn verify(&self, scope: CloseId, feature: Feature, selector: &str) -> bool {
        let node = &self.nodes[scope.index()];
        if node.rings.is_empty() && node.embedded.is_empty() {
            return true;
        }
        if node.rings.iter().any(|fs| fs.accepts(feature, selector)) {
            return true;
        }
        node.embedded
            .iter()
            .any(|&child| self.verify(child, feature, selector))
    }

    pub fn is_closed(&self, scope: CloseId) -> bool {
        !self.nodes[scope.index()].rings.is_empty()
    }

    /// Whether `feature` is an explicitly declared (non-pattern,
    /// non-ellipsis) member of `scope`'s own rings — used to distinguish
    /// "allowed" from "required" at the exposed API boundary.
    pub fn is_declared(&self, scope: CloseId, feature: Feature) -> bool {
        self.nodes[scope.index()]
            .rings
            .iter()
            .any(|fs| fs.is_declared(feature))
    }

    /// Mark-and-sweep compaction: keeps only nodes reachable from `live`
    /// (by parent or embedding links) and returns the remap from old to
    /// new ids. Long evaluations accumulate `insert_subtree`/`insert_embed`
    /// scopes that outlive their vertices; compacting keeps the canopy
    /// from growing unboundedly across a large configuration.
    pub fn compact(&mut self, live: &[CloseId]) -> HashMap<CloseId, CloseId> {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack: Vec<CloseId> = live.to_vec();
        while let Some(id) = stack.pop() {
            if reachable[id.index()] {
                continue;
            }
            reachable[id.index()] = true;
            let node = &self.nodes[id.index()];
            if let Some(p) = node.parent {
                stack.push(p);
            }
            stack.extend(node.embedded.iter().copied());
        }

        let mut remap = HashMap::new();
        let mut new_nodes = Vec::new();
        for (old_idx, keep) in reachable.iter().enumerate() {
            if *keep {
                let new_id = CloseId(new_nodes.len() as u32);
                remap.insert(CloseId(old_idx as u32), new_id);
                new_nodes.push(self.nodes[old_idx].clone());
            }
        }
        for node in &mut new_nodes {
            if let Some(p) = node.parent {
                node.parent = remap.get(&p).copied();
            }
            node.embedded.retain(|e| remap.contains_key(e));
            for e in &mut node.embedded {
                *e = remap[e];
            }
        }
        self.nodes = new_nodes;
        remap
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feat(n: u32) -> Feature {
        Feature::integer(n)
    }

    #[test]
    fn open_root_accepts_everything() {
        let mut arena = CloseArena::new();
        let root = arena.root();
        assert!(arena.verify(root, feat(1), "1"));
        assert!(!arena.is_closed(root));
    }

    #[test]
    fn definition_rejects_undeclared_field() {
        let mut arena = CloseArena::new();
        let root = arena.root();
        let mut fs = FieldSet::new();
        fs.insert_declared(feat(1));
        let scope = arena.insert_definition(root, fs);
        assert!(arena.verify(scope, feat(1), "1"));
        assert!(!arena.verify(scope, feat(2), "2"));
        assert!(arena.is_closed(scope));
    }

    #[test]
    fn two_rings_union_their_allowed_fields() {
        let mut arena = CloseArena::new();
        let root = arena.root();
        let mut fs_a = FieldSet::new();
        fs_a.insert_declared(feat(1));
        let mut fs_b = FieldSet::new();
        fs_b.insert_declared(feat(2));
        let scope = arena.insert_definition(root, fs_a);
        let scope = arena.insert_definition(scope, fs_b);
        assert!(arena.verify(scope, feat(1), "1"));
        assert!(arena.verify(scope, feat(2), "2"));
        assert!(!arena.verify(scope, feat(3), "3"));
    }

    #[test]
    fn embedding_opens_closed_parent() {
        let mut arena = CloseArena::new();
        let root = arena.root();
        let mut fs = FieldSet::new();
        fs.insert_declared(feat(1));
        let closed = arena.insert_definition(root, fs);
        let embed_scope = arena.insert_embed(closed);
        assert!(arena.verify(closed, feat(2), "2") == false);
        // But fields declared within the embedded scope are visible from
        // the parent's point of view once inserted there too.
        let mut embed_fs = FieldSet::new();
        embed_fs.insert_declared(feat(2));
        arena.insert_definition(embed_scope, embed_fs);
        assert!(arena.verify(closed, feat(2), "2"));
    }

    #[test]
    fn subtree_scope_does_not_leak_into_parent() {
        let mut arena = CloseArena::new();
        let root = arena.root();
        let child = arena.insert_subtree(root);
        let grandchild_embed = arena.insert_embed(child);
        let mut fs = FieldSet::new();
        fs.insert_declared(feat(1));
        arena.insert_definition(grandchild_embed, fs);

        // `child` closing itself off must not affect `root`, nor any
        // sibling subtree that also descends from `root`.
        assert!(!arena.verify(child, feat(2), "2"));
        let sibling = arena.insert_subtree(root);
        assert!(arena.verify(root, feat(2), "2"));
        assert!(arena.verify(sibling, feat(2), "2"));
    }

    #[test]
    fn compact_retains_embedded_scopes_but_drops_truly_unreachable_ones() {
        let mut arena = CloseArena::new();
        let root = arena.root();
        let mut fs = FieldSet::new();
        fs.insert_declared(feat(1));
        let live_scope = arena.insert_definition(root, fs);
        let embed_scope = arena.insert_embed(root);
        let mut embed_fs = FieldSet::new();
        embed_fs.insert_declared(feat(2));
        arena.insert_definition(embed_scope, embed_fs);
        let unrelated = arena.root();
        assert_eq!(arena.len(), 3);

        let remap = arena.compact(&[live_scope]);
        assert_eq!(arena.len(), 2);
        assert!(!remap.contains_key(&unrelated));

        let new_scope = remap[&live_scope];
        assert!(arena.verify(new_scope, feat(1), "1"));
        // field 2 only lives in the embedded scope — compact must keep it
        // reachable so `verify`'s recursion into `embedded` still finds it.
        assert!(arena.verify(new_scope, feat(2), "2"));
    }
}
