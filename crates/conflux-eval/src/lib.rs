//! The vertex evaluator: drives the data model in `conflux-model` to a
//! finalized value.
//!
//! Layering:
//! - [`limits`]/[`runtime`]: what an evaluation run is built and bounded by.
//! - [`cache`]: the per-pass idempotence cache.
//! - [`disjunction`]: the cross-product/default-narrowing engine.
//! - [`expand`]: the generic comprehension/dynamic-field fixed-point loop.
//! - [`driver`]: orchestrates all of the above over one vertex graph.
//! - [`trace`]/[`diagnostics`]: observability, standing in for a
//!   `log`/`tracing` dependency the teacher never carries.
//! - [`api`]: the four functions everything else is reached through.

pub mod api;
pub mod cache;
pub mod diagnostics;
pub mod disjunction;
pub mod driver;
pub mod expand;
pub mod limits;
pub mod runtime;
pub mod trace;

pub use api::{accept, equal, evaluate, evaluate_traced, unify};
pub use cache::IdempotenceCache;
pub use diagnostics::{DiagnosticCollector, DiagnosticMessage, Fix, RelatedInfo, Severity};
pub use disjunction::{unify_disjunctions, Branches, DefaultMode};
pub use driver::Driver;
pub use expand::{run_fixed_point, ExpansionOutcome, Expander};
pub use limits::{EvalLimits, EvaluatorBuilder};
pub use runtime::Runtime;
pub use trace::{NoopTracer, PrintTracer, Tracer};
