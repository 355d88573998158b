//! The evaluator's shared handle — spec §5, §9.
//!
//! One [`Runtime`] is built per top-level evaluation and owns every arena
//! the vertex graph is allocated into, plus the label table and resolved
//! package cache. The package cache is the one piece of state spec §5
//! calls out as potentially shared across concurrently-evaluated
//! documents, so it alone is mutex-guarded; everything else is only ever
//! touched by the single thread driving the evaluation.

use crate::limits::EvalLimits;
use conflux_core::LabelTable;
use conflux_model::{CloseArena, EnvArena, Value, VertexArena};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct Runtime {
    pub labels: LabelTable,
    pub vertices: VertexArena,
    pub envs: EnvArena,
    pub acceptors: CloseArena,
    pub limits: EvalLimits,
    packages: Mutex<HashMap<String, Value>>,
}

impl Runtime {
    pub fn new(limits: EvalLimits) -> Self {
        Self {
            labels: LabelTable::new(),
            vertices: VertexArena::new(),
            envs: EnvArena::new(),
            acceptors: CloseArena::new(),
            limits,
            packages: Mutex::new(HashMap::new()),
        }
    }

    /// A previously evaluated package's exported value, if another
    /// import site already resolved it.
    pub fn cached_package(&self, import_path: &str) -> Option<Value> {
        self.packages
            .lock()
            .expect("package cache poisoned")
            .get(import_path)
            .cloned()
    }

    pub fn cache_package(&self, import_path: impl Into<String>, value: Value) {
        self.packages
            .lock()
            .expect("package cache poisoned")
            .insert(import_path.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_cache_round_trips() {
        let rt = Runtime::new(EvalLimits::default());
        assert!(rt.cached_package("example.com/pkg").is_none());
        rt.cache_package("example.com/pkg", Value::int(42));
        assert_eq!(rt.cached_package("example.com/pkg"), Some(Value::int(42)));
    }
}
