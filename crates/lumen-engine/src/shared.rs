//! The graph shared between the tick loop and the control plane.
//!
//! One mutex guards the whole [`FilterGraph`]. The tick loop holds it for a
//! full `update` + `process`; each control operation holds it for one
//! mutation. A mutation therefore never lands in the middle of a tick.

use std::sync::Arc;

use lumen_core::FilterGraph;
use parking_lot::{Mutex, MutexGuard};

/// Cheaply cloneable handle to the running graph.
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<Mutex<FilterGraph>>,
}

impl SharedGraph {
    /// Takes ownership of `graph`.
    pub fn new(graph: FilterGraph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Blocks until no tick or mutation is in progress.
    pub fn lock(&self) -> MutexGuard<'_, FilterGraph> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut FilterGraph) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Swaps in a whole new graph and returns the old one.
    pub fn replace(&self, graph: FilterGraph) -> FilterGraph {
        std::mem::replace(&mut *self.inner.lock(), graph)
    }
}

impl std::fmt::Debug for SharedGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(graph) => f
                .debug_struct("SharedGraph")
                .field("nodes", &graph.node_count())
                .field("connections", &graph.connection_count())
                .finish(),
            None => f.write_str("SharedGraph(<locked>)"),
        }
    }
}
