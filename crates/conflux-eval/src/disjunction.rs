//! The disjunction engine — spec §4.G.
//!
//! [`conflux_model::value::unify`]'s `Disjunction` handling only
//! guarantees the U1 law — unification distributes over one disjunction's
//! branches. Combining *two* disjunctions (unifying `a|b` with `c|d`, or
//! narrowing a comprehension-generated set of alternatives) needs a real
//! cross product plus default-mode bookkeeping, which is what lives here:
//! this is "component G" proper, built on top of the pure algebra in
//! `conflux_model::value`.

use crate::limits::EvalLimits;
use conflux_model::{unify, Bottom, Value};

/// The three-state default marker CUE's own disjunction algorithm tracks
/// per branch while it's still being combined — a branch is definitely
/// the result's default (`Is`), definitely not (`Not`), or its status is
/// still open (`Maybe`) until combined with something more decisive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DefaultMode {
    Maybe,
    Is,
    Not,
}

/// Combine default-modes across the cross product of two disjunctions'
/// branches being unified together — spec's "unify-combine (conjunction
/// of branches)" table: `not` dominates, then `is`, else `maybe`.
pub fn unify_combine(a: DefaultMode, b: DefaultMode) -> DefaultMode {
    use DefaultMode::*;
    match (a, b) {
        (Not, _) | (_, Not) => Not,
        (Is, _) | (_, Is) => Is,
        (Maybe, Maybe) => Maybe,
    }
}

/// Combine default-modes when merging branches via `|` itself (spec's
/// "disjoin-combine (result of a disjunction)" table) — reserved for a
/// future `|`-distribution entry point; `cross` unifies branches, so it
/// uses [`unify_combine`] instead.
pub fn disjoin_combine(a: DefaultMode, b: DefaultMode) -> DefaultMode {
    use DefaultMode::*;
    match (a, b) {
        (Is, Is) => Is,
        (Not, Not) => Not,
        (Is, Not) | (Not, Is) => Not,
        (Is, Maybe) | (Maybe, Is) => Is,
        (Not, Maybe) | (Maybe, Not) => Not,
        (Maybe, Maybe) => Maybe,
    }
}

/// A disjunction expressed as explicit branch/default-mode pairs, the
/// working representation this module operates on before it's collapsed
/// back down into a plain [`Value`].
#[derive(Clone, Debug)]
pub struct Branches(pub Vec<(Value, DefaultMode)>);

impl Branches {
    pub fn from_value(v: &Value) -> Branches {
        match v {
            Value::Disjunction(parts, num_defaults) => Branches(
                parts
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let mode = if i < *num_defaults {
                            DefaultMode::Is
                        } else {
                            DefaultMode::Maybe
                        };
                        (p.clone(), mode)
                    })
                    .collect(),
            ),
            other => Branches(vec![(other.clone(), DefaultMode::Is)]),
        }
    }

    /// Cross product with `other`, unifying each pair of branch values
    /// and combining their default-modes. §4.G "cross-product search".
    pub fn cross(&self, other: &Branches, limits: &EvalLimits) -> Result<Branches, Bottom> {
        let total = self.0.len() * other.0.len();
        if total > limits.max_disjunction_branches {
            return Err(Bottom::incomplete(format!(
                "disjunction cross product of {total} branches exceeds the configured limit"
            )));
        }
        let mut out = Vec::with_capacity(total);
        for (va, ma) in &self.0 {
            for (vb, mb) in &other.0 {
                out.push((unify(va, vb), unify_combine(*ma, *mb)));
            }
        }
        Ok(Branches(out))
    }

    /// Resolve to a final [`Value`]: drop branches that collapsed to
    /// bottom, then apply CUE's default-narrowing rule — if any `Is`
    /// branch survives, the result narrows to just the surviving
    /// defaults; otherwise every surviving branch remains, marked plain.
    pub fn resolve(self) -> Result<Value, Bottom> {
        let surviving: Vec<(Value, DefaultMode)> =
            self.0.into_iter().filter(|(v, _)| !v.is_bottom()).collect();
        if surviving.is_empty() {
            return Err(Bottom::eval_error(
                "every disjunction branch conflicts with its unified value",
            ));
        }
        let defaults: Vec<Value> = surviving
            .iter()
            .filter(|(_, mode)| *mode == DefaultMode::Is)
            .map(|(v, _)| v.clone())
            .collect();
        if !defaults.is_empty() {
            return Ok(if defaults.len() == 1 {
                defaults.into_iter().next().unwrap()
            } else {
                Value::Disjunction(defaults.clone(), defaults.len())
            });
        }
        let plain: Vec<Value> = surviving.into_iter().map(|(v, _)| v).collect();
        Ok(if plain.len() == 1 {
            plain.into_iter().next().unwrap()
        } else {
            Value::Disjunction(plain, 0)
        })
    }
}

/// Unify two (possibly plain) values where at least one is a
/// disjunction, producing a properly flattened, default-resolved result.
pub fn unify_disjunctions(a: &Value, b: &Value, limits: &EvalLimits) -> Result<Value, Bottom> {
    let ba = Branches::from_value(a);
    let bb = Branches::from_value(b);
    ba.cross(&bb, limits)?.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_model::Value;

    #[test]
    fn disjoin_combine_matches_the_spec_table() {
        use DefaultMode::*;
        assert_eq!(disjoin_combine(Is, Is), Is);
        assert_eq!(disjoin_combine(Is, Not), Not);
        assert_eq!(disjoin_combine(Not, Is), Not);
        assert_eq!(disjoin_combine(Is, Maybe), Is);
        assert_eq!(disjoin_combine(Maybe, Is), Is);
        assert_eq!(disjoin_combine(Not, Maybe), Not);
        assert_eq!(disjoin_combine(Maybe, Not), Not);
        assert_eq!(disjoin_combine(Maybe, Maybe), Maybe);
        assert_eq!(disjoin_combine(Not, Not), Not);
    }

    #[test]
    fn default_survives_alone() {
        // m: *1 | 2 | 3, unified with nothing further: 1 is the default.
        let d = Value::Disjunction(vec![Value::int(1), Value::int(2), Value::int(3)], 1);
        let result = Branches::from_value(&d).resolve().unwrap();
        assert_eq!(result, Value::int(1));
    }

    #[test]
    fn eliminating_the_default_still_marks_survivors_is_per_unify_combine() {
        // (*1 | 2 | 3) & >=2 -> 1 conflicts and drops out; 2 and 3 survive
        // unification with a plain (non-disjunctive) `>=2`, so per the
        // unify-combine table their `maybe` mode combines with the plain
        // operand's `is` into `is` (`is & maybe = is`) — both remain
        // marked as defaults rather than falling back to plain.
        let d = Value::Disjunction(vec![Value::int(1), Value::int(2), Value::int(3)], 1);
        let limits = EvalLimits::default();
        let bound = Value::Bound(conflux_model::RelOp::Ge, Box::new(Value::int(2)));
        let result = unify_disjunctions(&d, &bound, &limits).unwrap();
        match result {
            Value::Disjunction(parts, num_defaults) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(num_defaults, 2);
            }
            other => panic!("expected a plain disjunction, got {other:?}"),
        }
    }

    #[test]
    fn cross_product_respects_branch_limit() {
        let big = Value::Disjunction((0..100).map(Value::int).collect(), 0);
        let limits = EvalLimits {
            max_disjunction_branches: 10,
            ..EvalLimits::default()
        };
        let err = unify_disjunctions(&big, &big, &limits).unwrap_err();
        assert_eq!(err.code, conflux_model::BottomCode::Incomplete);
    }

    #[test]
    fn non_disjunctive_operands_still_unify() {
        let result = unify_disjunctions(&Value::int(1), &Value::Top, &EvalLimits::default());
        assert_eq!(result.unwrap(), Value::int(1));
    }
}
