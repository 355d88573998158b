//! Evaluation resource limits — spec §5 Concurrency & Resource Model.
//!
//! A builder-with-defaults over [`EvalLimits`], mirroring how the teacher
//! exposes fuel and stack-depth caps: sensible defaults out of the box,
//! overridable one field at a time before the evaluator is built.

use crate::runtime::Runtime;

/// Hard caps the evaluator enforces to keep pathological input (a
/// disjunction with exponential fan-out, a comprehension whose fixed
/// point never stabilizes) from running unbounded.
#[derive(Clone, Copy, Debug)]
pub struct EvalLimits {
    /// Caps the branch count a single disjunction cross-product may grow
    /// to before it's treated as `bottom(incomplete)` rather than
    /// explored further (§4.G supplement).
    pub max_disjunction_branches: usize,
    /// Caps fixed-point rounds of the comprehension/dynamic-field
    /// expander (§4.H) before giving up with `bottom(incomplete)`.
    pub max_comprehension_rounds: usize,
    /// Caps recursion depth through the vertex evaluator driver (§4.I),
    /// guarding against runaway structural expansion.
    pub max_vertex_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_disjunction_branches: 4096,
            max_comprehension_rounds: 10_000,
            max_vertex_depth: 1_000,
        }
    }
}

/// Builds an evaluator [`Runtime`] with possibly-overridden [`EvalLimits`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluatorBuilder {
    limits: EvalLimits,
}

impl EvaluatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_disjunction_branches(mut self, n: usize) -> Self {
        self.limits.max_disjunction_branches = n;
        self
    }

    pub fn max_comprehension_rounds(mut self, n: usize) -> Self {
        self.limits.max_comprehension_rounds = n;
        self
    }

    pub fn max_vertex_depth(mut self, n: usize) -> Self {
        self.limits.max_vertex_depth = n;
        self
    }

    pub fn build(self) -> Runtime {
        Runtime::new(self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let limits = EvalLimits::default();
        assert!(limits.max_disjunction_branches > 0);
        assert!(limits.max_comprehension_rounds > 0);
    }

    #[test]
    fn builder_overrides_one_field_at_a_time() {
        let rt = EvaluatorBuilder::new().max_disjunction_branches(8).build();
        assert_eq!(rt.limits.max_disjunction_branches, 8);
        assert_eq!(
            rt.limits.max_comprehension_rounds,
            EvalLimits::default().max_comprehension_rounds
        );
    }
}
