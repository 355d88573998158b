//! Conjuncts — spec §3 "Conjunct".
//!
//! A conjunct pairs an expression with the environment it must be
//! evaluated in and the closedness scope its fields are checked against.
//! A vertex accumulates conjuncts from every place that contributes to
//! it (a direct field value, a referenced definition, an embedding); the
//! vertex evaluator (§4.I) unifies all of them together to produce the
//! vertex's value.

use crate::acceptor::CloseId;
use crate::env::EnvId;
use crate::expr::Expr;
use std::rc::Rc;

/// One contribution to a vertex's value.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conjunct {
    pub env: EnvId,
    pub expr: Rc<Expr>,
    pub close_id: CloseId,
}

impl Conjunct {
    pub fn new(env: EnvId, expr: Rc<Expr>, close_id: CloseId) -> Self {
        Self { env, expr, close_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvId;
    use conflux_core::{FileId, Position, Symbol};

    #[test]
    fn conjunct_carries_its_environment_and_scope() {
        let env = EnvId::from_raw(0);
        let close = crate::acceptor::CloseId::from_raw(0);
        let expr = Rc::new(Expr::Null(Position::new(
            FileId::from_symbol(Symbol::from_raw(0)),
            0,
        )));
        let c = Conjunct::new(env, expr.clone(), close);
        assert!(Rc::ptr_eq(&c.expr, &expr));
    }
}
