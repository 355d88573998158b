//! The bottom taxonomy — spec §3 "Bottom", §7.
//!
//! `bottom` is the least element of the value lattice: conflicting
//! constraints unify to it, and it absorbs everything it touches. A
//! [`Bottom`] carries a [`BottomCode`] plus the positions of every conjunct
//! that contributed to the conflict, collected (not deduplicated) in the
//! order they were discovered; callers sort by [`Position::sort_key`] only
//! when they actually emit a diagnostic.

use conflux_core::Position;
use thiserror::Error;

/// Why a value collapsed to bottom.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BottomCode {
    /// A vertex has conjuncts still pending that block a final value.
    #[error("incomplete")]
    Incomplete,
    /// A reference cycle was found with no structural progress.
    #[error("reference cycle")]
    ReferenceCycle,
    /// A structural cycle: the value refers to a vertex that is still
    /// evaluating structurally, not just through a reference.
    #[error("structural cycle")]
    StructuralCycle,
    /// Two concrete values conflict (kind mismatch, unequal scalars, a
    /// bound rejecting a scalar, ...).
    #[error("conflicting values")]
    EvalError,
    /// A user-authored failure (e.g. from a builtin validator, or an
    /// explicit bottom literal in source).
    #[error("explicit error")]
    UserError,
}

/// A concrete bottom value: a code, a human-readable message, and the
/// positions of every conjunct that contributed.
#[derive(Clone, PartialEq, Debug, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{code}: {message}")]
pub struct Bottom {
    pub code: BottomCode,
    pub message: String,
    pub positions: Vec<Position>,
}

impl Bottom {
    pub fn new(code: BottomCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            positions: Vec::new(),
        }
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::new(BottomCode::Incomplete, message)
    }

    pub fn reference_cycle(message: impl Into<String>) -> Self {
        Self::new(BottomCode::ReferenceCycle, message)
    }

    pub fn structural_cycle(message: impl Into<String>) -> Self {
        Self::new(BottomCode::StructuralCycle, message)
    }

    pub fn eval_error(message: impl Into<String>) -> Self {
        Self::new(BottomCode::EvalError, message)
    }

    pub fn user_error(message: impl Into<String>) -> Self {
        Self::new(BottomCode::UserError, message)
    }

    pub fn with_position(mut self, pos: Position) -> Self {
        self.positions.push(pos);
        self
    }

    pub fn with_positions(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.positions.extend(positions);
        self
    }

    /// Merge two bottoms discovered for the same vertex. Keeps the more
    /// specific code (a cycle code is only reported when nothing more
    /// concrete is available) and concatenates positions.
    pub fn merge(mut self, other: Bottom) -> Bottom {
        let keep_other_code = matches!(
            (self.code, other.code),
            (BottomCode::ReferenceCycle, BottomCode::EvalError)
                | (BottomCode::ReferenceCycle, BottomCode::UserError)
                | (BottomCode::StructuralCycle, BottomCode::EvalError)
                | (BottomCode::StructuralCycle, BottomCode::UserError)
                | (BottomCode::Incomplete, _)
        );
        self.positions.extend(other.positions.iter().copied());
        if keep_other_code {
            self.code = other.code;
            self.message = other.message;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_concrete_conflict_over_cycle() {
        let cycle = Bottom::reference_cycle("a -> a");
        let conflict = Bottom::eval_error("2 != 3");
        let merged = cycle.merge(conflict);
        assert_eq!(merged.code, BottomCode::EvalError);
    }

    #[test]
    fn merge_concatenates_positions() {
        let a = Bottom::eval_error("x").with_position(Position::new(
            conflux_core::FileId::from_symbol(conflux_core::Symbol::from_raw(0)),
            1,
        ));
        let b = Bottom::eval_error("y").with_position(Position::new(
            conflux_core::FileId::from_symbol(conflux_core::Symbol::from_raw(0)),
            2,
        ));
        let merged = a.merge(b);
        assert_eq!(merged.positions.len(), 2);
    }
}
