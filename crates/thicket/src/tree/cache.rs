//! Per-node memo table for facts derived from a subtree

use std::sync::{Arc, OnceLock};

/// The kinds of fact a node can memoize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    /// Distinct names of everything called anywhere in the subtree
    Functions,
    /// Distinct variable names referenced anywhere in the subtree
    Variables,
}

/// Facts memoized on a single node.
///
/// Lives inline in its [`ParseTree`](super::ParseTree), so it is dropped
/// together with the node it describes. Readers never block: a fact that is
/// missing is computed without holding any lock, and when two threads race
/// the loser's result is discarded (both computations are equal).
#[derive(Debug, Default)]
pub(crate) struct DerivedFacts {
    functions: OnceLock<Arc<[String]>>,
    variables: OnceLock<Arc<[String]>>,
}

impl DerivedFacts {
    fn cell(&self, kind: FactKind) -> &OnceLock<Arc<[String]>> {
        match kind {
            FactKind::Functions => &self.functions,
            FactKind::Variables => &self.variables,
        }
    }

    /// Return the memoized fact, computing and storing it first if needed.
    pub(crate) fn get_or_compute(
        &self,
        kind: FactKind,
        compute: impl FnOnce() -> Vec<String>,
    ) -> Arc<[String]> {
        let cell = self.cell(kind);
        if let Some(cached) = cell.get() {
            return Arc::clone(cached);
        }
        let computed: Arc<[String]> = compute().into();
        // Lost races keep the winner's (equal) value
        let _ = cell.set(Arc::clone(&computed));
        cell.get().map(Arc::clone).unwrap_or(computed)
    }

    pub(crate) fn is_cached(&self, kind: FactKind) -> bool {
        self.cell(kind).get().is_some()
    }

    /// Forget everything; called whenever the owning node is mutated.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
