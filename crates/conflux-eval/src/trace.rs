//! Zero-cost evaluation tracing, standing in for a `log`/`tracing`
//! dependency the teacher itself never takes — see SPEC_FULL.md's
//! ambient-stack section. A [`Tracer`] is a trait with default no-op
//! methods; [`NoopTracer`] compiles away entirely, [`PrintTracer`] is a
//! plain `eprintln!` implementation for local debugging.

use conflux_model::{Bottom, Status, VertexId};

pub trait Tracer {
    fn enter_vertex(&mut self, _vertex: VertexId, _selector: &str) {}
    fn status_change(&mut self, _vertex: VertexId, _from: Status, _to: Status) {}
    fn conjunct_applied(&mut self, _vertex: VertexId, _index: usize) {}
    fn conflict(&mut self, _vertex: VertexId, _bottom: &Bottom) {}
    fn disjunction_branch(&mut self, _vertex: VertexId, _branch: usize, _survived: bool) {}
    fn comprehension_round(&mut self, _vertex: VertexId, _round: usize, _progress: bool) {}
}

/// Compiles away to nothing; the default tracer for production use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Prints every event to stderr. Useful when debugging a single
/// evaluation by hand; not meant for production logging volume.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintTracer;

impl Tracer for PrintTracer {
    fn enter_vertex(&mut self, vertex: VertexId, selector: &str) {
        eprintln!("enter {vertex:?} ({selector})");
    }

    fn status_change(&mut self, vertex: VertexId, from: Status, to: Status) {
        eprintln!("{vertex:?}: {from:?} -> {to:?}");
    }

    fn conjunct_applied(&mut self, vertex: VertexId, index: usize) {
        eprintln!("{vertex:?}: applied conjunct #{index}");
    }

    fn conflict(&mut self, vertex: VertexId, bottom: &Bottom) {
        eprintln!("{vertex:?}: {bottom}");
    }

    fn disjunction_branch(&mut self, vertex: VertexId, branch: usize, survived: bool) {
        eprintln!(
            "{vertex:?}: disjunct #{branch} {}",
            if survived { "survived" } else { "eliminated" }
        );
    }

    fn comprehension_round(&mut self, vertex: VertexId, round: usize, progress: bool) {
        eprintln!(
            "{vertex:?}: comprehension round {round} ({})",
            if progress { "progress" } else { "fixed point" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_tracer_accepts_every_call() {
        let mut t = NoopTracer;
        let v = VertexId::from_raw(0);
        t.enter_vertex(v, "x");
        t.status_change(v, Status::Unprocessed, Status::Evaluating);
        t.conjunct_applied(v, 0);
        t.disjunction_branch(v, 0, true);
        t.comprehension_round(v, 0, false);
    }
}
