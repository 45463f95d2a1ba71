//! Single-writer/multiple-reader handle over a capacity graph
//!
//! Solves run on a snapshot cloned under the read lock, and capacity updates
//! take the write lock, so a solve observes either the pre-update or the
//! post-update value of every edge, never a mix.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::sync::{Arc, PoisonError, RwLock};

use crate::algorithm::traits::{Capacity, Result};
use crate::data_structures::graph::CapacityGraph;

#[derive(Debug, Clone, Default)]
pub struct SharedCapacityGraph {
    inner: Arc<RwLock<CapacityGraph>>,
}

impl SharedCapacityGraph {
    pub fn new(graph: CapacityGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Consistent copy of the current graph
    pub fn snapshot(&self) -> CapacityGraph {
        self.read(CapacityGraph::clone)
    }

    /// Runs `f` against the graph under the read lock
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&CapacityGraph) -> T,
    {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Replaces one edge's capacity under the write lock
    pub fn update_capacity(&self, from: &str, to: &str, capacity: Capacity) -> Result<Capacity> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.update_capacity(from, to, capacity)
    }
}
