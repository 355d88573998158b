//! The value, vertex, and closedness model for the Conflux evaluator.
//!
//! Layering, bottom to top:
//! - [`kind`]: the basic-kind lattice.
//! - [`error`]: the bottom taxonomy.
//! - [`value`]: the value algebra (`unify`, `binop`) built on both.
//! - [`expr`]: the expression tree CORE walks (built elsewhere, §1).
//! - [`fieldset`] and [`acceptor`]: closedness.
//! - [`env`], [`conjunct`], [`vertex`]: the evaluation graph itself.

pub mod acceptor;
pub mod conjunct;
pub mod env;
pub mod error;
pub mod expr;
pub mod fieldset;
pub mod kind;
pub mod value;
pub mod vertex;

pub use acceptor::{CloseArena, CloseId};
pub use conjunct::Conjunct;
pub use env::{EnvArena, EnvId, Environment};
pub use error::{Bottom, BottomCode};
pub use expr::{Expr, FieldDecl, InterpPart, UnaryOp};
pub use fieldset::{pattern_matches_selector, BulkPattern, FieldSet};
pub use kind::Kind;
pub use value::{binop, unify, ArithOp, BuiltinValidator, ListOpenness, Literal, RelOp, Value};
pub use vertex::{Status, Vertex, VertexArena, VertexId};
