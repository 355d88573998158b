//! The comprehension / dynamic-field expander — spec §4.H.
//!
//! Dynamic field labels (`(expr): v`), `if` embeddings, and `for`
//! comprehensions may depend on fields that are themselves still being
//! expanded elsewhere in the same struct, so they can't always resolve on
//! the first pass. This module drives the fixed-point loop generically —
//! keep retrying whatever hasn't resolved yet until either nothing is
//! left, a round makes no progress (stalled), or the round cap is hit —
//! while the actual attempt to resolve one item (look up a reference,
//! evaluate a condition, iterate a struct or a list) is supplied by
//! whatever owns the environment and vertex graph, since that's
//! `driver`'s job, not this module's.

use conflux_model::{Bottom, Conjunct};

/// What came of trying to resolve one pending expansion item this round.
pub enum ExpansionOutcome {
    /// Fully resolved into zero or more new conjuncts to fold in.
    Resolved(Vec<Conjunct>),
    /// Still depends on something not yet available; retry next round.
    Blocked,
    /// Resolved, but to an error (a bad label type, a non-iterable `for`
    /// source, ...).
    Failed(Bottom),
}

/// Supplies the actual resolution attempt for one pending item. The
/// vertex evaluator driver implements this, since resolving a dynamic
/// label or a `for` source needs the environment chain and the vertex
/// graph.
pub trait Expander {
    type Item;
    fn try_resolve(&mut self, item: &Self::Item) -> ExpansionOutcome;
}

/// Runs `expander` over `pending` until every item resolves, a round
/// makes no progress, or `max_rounds` is exceeded.
pub fn run_fixed_point<E>(
    expander: &mut E,
    mut pending: Vec<E::Item>,
    max_rounds: usize,
) -> Result<Vec<Conjunct>, Bottom>
where
    E: Expander,
{
    let mut resolved = Vec::new();
    let mut round = 0usize;
    while !pending.is_empty() {
        round += 1;
        if round > max_rounds {
            return Err(Bottom::incomplete(
                "comprehension/dynamic-field expansion did not reach a fixed point",
            ));
        }
        let mut still_pending = Vec::new();
        let mut made_progress = false;
        for item in pending {
            match expander.try_resolve(&item) {
                ExpansionOutcome::Resolved(conjuncts) => {
                    made_progress = true;
                    resolved.extend(conjuncts);
                }
                ExpansionOutcome::Blocked => still_pending.push(item),
                ExpansionOutcome::Failed(bottom) => return Err(bottom),
            }
        }
        if !made_progress {
            return Err(Bottom::incomplete(
                "comprehension/dynamic-field expansion stalled: nothing new resolved",
            ));
        }
        pending = still_pending;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_core::{FileId, Position, Symbol};
    use conflux_model::{CloseId, EnvId, Expr};
    use std::rc::Rc;

    fn dummy_conjunct() -> Conjunct {
        Conjunct::new(
            EnvId::from_raw(0),
            Rc::new(Expr::Null(Position::new(
                FileId::from_symbol(Symbol::from_raw(0)),
                0,
            ))),
            CloseId::from_raw(0),
        )
    }

    /// An item that blocks for `blocked_rounds` rounds, then resolves.
    struct CountingExpander;

    impl Expander for CountingExpander {
        type Item = u32;
        fn try_resolve(&mut self, item: &u32) -> ExpansionOutcome {
            if *item == 0 {
                ExpansionOutcome::Resolved(vec![dummy_conjunct()])
            } else {
                ExpansionOutcome::Blocked
            }
        }
    }

    #[test]
    fn resolves_immediately_when_nothing_blocks() {
        let mut e = CountingExpander;
        let result = run_fixed_point(&mut e, vec![0, 0], 10).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn stalling_returns_incomplete() {
        let mut e = CountingExpander;
        let err = run_fixed_point(&mut e, vec![1], 10).unwrap_err();
        assert_eq!(err.code, conflux_model::BottomCode::Incomplete);
    }

    #[test]
    fn zero_round_budget_is_incomplete() {
        let mut e = CountingExpander;
        let err = run_fixed_point(&mut e, vec![1], 0).unwrap_err();
        assert_eq!(err.code, conflux_model::BottomCode::Incomplete);
    }
}
