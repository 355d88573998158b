//! Core data structures shared across the Conflux evaluator.
//!
//! Two layers:
//! - **Interning** (`interner`): generic string deduplication (`Symbol`).
//! - **Labels** (`label`): the [`Feature`](label::Feature) lattice built on
//!   top of interning, plus source [`Position`](position::Position)s for
//!   diagnostics.

pub mod interner;
pub mod label;
pub mod position;

pub use interner::{Interner, Symbol};
pub use label::{Feature, FeatureKind, LabelTable};
pub use position::{FileId, Position};
