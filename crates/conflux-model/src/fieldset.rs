//! Field sets — spec §3 "Field-set optionals", §4.F.
//!
//! A [`FieldSet`] is the allow-list a closed struct (or closedness ring
//! member) checks arriving fields against: explicitly declared fields,
//! bulk/pattern optional-field matchers (`[=~"^x_"]: int`), and the
//! `...` ellipsis that opens the set entirely. Every mutator is a set
//! union, so [`FieldSet::merge`] (and therefore building up a set field
//! by field) is commutative and order-independent — §4.F's
//! "match-and-insert" guarantee: a pattern's value conjunct applies to
//! every field matching it regardless of which was declared first, so
//! callers keep each pattern's value expression alongside its text here
//! rather than discarding it once the allow-list check is built.

use crate::expr::Expr;
use conflux_core::Feature;
use indexmap::IndexSet;
use std::rc::Rc;

/// One bulk-optional matcher: its pattern text plus the value expression
/// every matching field must additionally unify with. `value` is absent
/// for a pattern registered purely to describe the allow-list (e.g. when
/// rebuilding a ring from an already-routed field set), with nothing left
/// to match-and-insert.
#[derive(Clone, Debug)]
pub struct BulkPattern {
    pub pattern: String,
    pub value: Option<Rc<Expr>>,
}

/// A single allow-list for one struct (or one acceptor ring member).
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    declared: IndexSet<Feature>,
    /// Bulk-optional patterns (glob-style: a literal, or a literal with a
    /// trailing `*`) paired with the value conjunct they contribute. The
    /// actual regexp engine is an external-interface concern (§6); CORE
    /// only needs *a* consistent matcher.
    patterns: Vec<BulkPattern>,
    ellipsis: bool,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_declared(&mut self, f: Feature) {
        self.declared.insert(f);
    }

    /// Registers a bare pattern with no associated value — used where
    /// only the allow-list matters (e.g. building a ring from an
    /// already-routed definition) and there's nothing to match-and-insert.
    pub fn insert_pattern(&mut self, pattern: impl Into<String>) {
        self.insert_bulk_raw(pattern, None);
    }

    /// Registers `pattern` together with the value every matching field
    /// must also unify with (§4.F match-and-insert).
    pub fn insert_bulk(&mut self, pattern: impl Into<String>, value: Rc<Expr>) {
        self.insert_bulk_raw(pattern, Some(value));
    }

    fn insert_bulk_raw(&mut self, pattern: impl Into<String>, value: Option<Rc<Expr>>) {
        let pattern = pattern.into();
        match self.patterns.iter_mut().find(|p| p.pattern == pattern) {
            Some(existing) => existing.value = existing.value.take().or(value),
            None => self.patterns.push(BulkPattern { pattern, value }),
        }
    }

    pub fn insert_ellipsis(&mut self) {
        self.ellipsis = true;
    }

    pub fn is_open(&self) -> bool {
        self.ellipsis
    }

    /// Union this set with `other`. Commutative and idempotent: the
    /// result accepts exactly the fields either set would have accepted.
    pub fn merge(&mut self, other: &FieldSet) {
        for &f in &other.declared {
            self.declared.insert(f);
        }
        for p in &other.patterns {
            if !self.patterns.iter().any(|existing| existing.pattern == p.pattern) {
                self.patterns.push(p.clone());
            }
        }
        self.ellipsis |= other.ellipsis;
    }

    /// Whether `feature` (displayed as `selector`) is allowed by this set.
    /// Hidden/definition bypass (§4.E) is handled by the caller, one
    /// level up, since it isn't a property of any one field set.
    pub fn accepts(&self, feature: Feature, selector: &str) -> bool {
        self.ellipsis
            || self.declared.contains(&feature)
            || self.patterns.iter().any(|p| pattern_matches_selector(&p.pattern, selector))
    }

    /// The value conjuncts of every bulk pattern that matches `selector` —
    /// what a newly routed field (or an already-present arc, the other
    /// direction of match-and-insert) must additionally unify with.
    pub fn matching_bulk_values(&self, selector: &str) -> impl Iterator<Item = &Rc<Expr>> {
        self.patterns
            .iter()
            .filter(move |p| pattern_matches_selector(&p.pattern, selector))
            .filter_map(|p| p.value.as_ref())
    }

    pub fn declared_len(&self) -> usize {
        self.declared.len()
    }

    /// Whether `feature` is one of this set's explicitly declared fields
    /// (as opposed to merely matching a bulk pattern or the ellipsis).
    pub fn is_declared(&self, feature: Feature) -> bool {
        self.declared.contains(&feature)
    }
}

/// Glob-style pattern match: a trailing `*` matches any suffix, otherwise
/// exact text equality. Exposed so callers doing match-and-insert against
/// already-routed arcs can test a pattern without going through a
/// [`FieldSet`].
pub fn pattern_matches_selector(pattern: &str, selector: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => selector.starts_with(prefix),
        None => selector == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feat(n: u32) -> Feature {
        Feature::integer(n)
    }

    #[test]
    fn declared_field_is_accepted() {
        let mut fs = FieldSet::new();
        fs.insert_declared(feat(1));
        assert!(fs.accepts(feat(1), "1"));
        assert!(!fs.accepts(feat(2), "2"));
    }

    #[test]
    fn ellipsis_opens_everything() {
        let mut fs = FieldSet::new();
        fs.insert_ellipsis();
        assert!(fs.accepts(feat(99), "99"));
    }

    #[test]
    fn pattern_matches_prefix() {
        let mut fs = FieldSet::new();
        fs.insert_pattern("x_*");
        assert!(fs.accepts(feat(1), "x_foo"));
        assert!(!fs.accepts(feat(2), "y_foo"));
    }

    #[test]
    fn is_declared_distinguishes_from_pattern_match() {
        let mut fs = FieldSet::new();
        fs.insert_declared(feat(1));
        fs.insert_pattern("x_*");
        assert!(fs.is_declared(feat(1)));
        assert!(fs.accepts(feat(2), "x_foo") && !fs.is_declared(feat(2)));
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = FieldSet::new();
        a.insert_declared(feat(1));
        let mut b = FieldSet::new();
        b.insert_pattern("z_*");

        let mut merged_ab = a.clone();
        merged_ab.merge(&b);
        let mut merged_ba = b.clone();
        merged_ba.merge(&a);

        assert_eq!(merged_ab.declared_len(), merged_ba.declared_len());
        assert!(merged_ab.accepts(feat(1), "1") && merged_ba.accepts(feat(1), "1"));
        assert!(merged_ab.accepts(feat(2), "z_x") && merged_ba.accepts(feat(2), "z_x"));
    }

    #[test]
    fn matching_bulk_values_surfaces_only_patterns_that_match() {
        use crate::expr::Expr;
        use conflux_core::{FileId, Position, Symbol};

        let pos = Position::new(FileId::from_symbol(Symbol::from_raw(0)), 0);
        let mut fs = FieldSet::new();
        fs.insert_bulk("x_*", Rc::new(Expr::Int(1, pos)));
        fs.insert_bulk("y_*", Rc::new(Expr::Int(2, pos)));

        let matched: Vec<_> = fs.matching_bulk_values("x_foo").collect();
        assert_eq!(matched.len(), 1);
        assert!(matches!(matched[0].as_ref(), Expr::Int(1, _)));
        assert_eq!(fs.matching_bulk_values("z_foo").count(), 0);
    }

    #[test]
    fn insert_pattern_then_insert_bulk_fills_in_the_value() {
        use crate::expr::Expr;
        use conflux_core::{FileId, Position, Symbol};

        let pos = Position::new(FileId::from_symbol(Symbol::from_raw(0)), 0);
        let mut fs = FieldSet::new();
        fs.insert_pattern("x_*");
        assert_eq!(fs.matching_bulk_values("x_foo").count(), 0);
        fs.insert_bulk("x_*", Rc::new(Expr::Int(7, pos)));
        assert_eq!(fs.matching_bulk_values("x_foo").count(), 1);
    }
}
