//! Store wrapper that counts the calls made through it.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use wgraph_core::error::Result;
use wgraph_core::{EdgeCost, EdgeMap, LabelPredicate, VertexAttributes, VertexLabel, WeightedGraphStore};

/// Snapshot of store call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// `get_vertex_edges` calls
    pub edge_reads: u64,
    /// `create_or_update_vertex` calls
    pub vertex_writes: u64,
    /// `vertex_exists` calls
    pub existence_checks: u64,
    /// `find_vertices` calls
    pub scans: u64,
    /// attribute reads and writes
    pub attribute_ops: u64,
    /// `delete_all_data` calls
    pub deletes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    edge_reads: AtomicU64,
    vertex_writes: AtomicU64,
    existence_checks: AtomicU64,
    scans: AtomicU64,
    attribute_ops: AtomicU64,
    deletes: AtomicU64,
}

/// Wraps a store and counts every operation
pub struct InstrumentedStore<S> {
    inner: S,
    counters: Counters,
}

impl<S> InstrumentedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counters: Counters::default(),
        }
    }

    pub fn stats(&self) -> StoreStats {
        let c = &self.counters;
        StoreStats {
            edge_reads: c.edge_reads.load(Ordering::Relaxed),
            vertex_writes: c.vertex_writes.load(Ordering::Relaxed),
            existence_checks: c.existence_checks.load(Ordering::Relaxed),
            scans: c.scans.load(Ordering::Relaxed),
            attribute_ops: c.attribute_ops.load(Ordering::Relaxed),
            deletes: c.deletes.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        let c = &self.counters;
        for counter in [
            &c.edge_reads,
            &c.vertex_writes,
            &c.existence_checks,
            &c.scans,
            &c.attribute_ops,
            &c.deletes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

#[async_trait]
impl<T, C, S> WeightedGraphStore<T, C> for InstrumentedStore<S>
where
    T: VertexLabel,
    C: EdgeCost,
    S: WeightedGraphStore<T, C>,
{
    async fn delete_all_data(&self) -> Result<bool> {
        bump(&self.counters.deletes);
        self.inner.delete_all_data().await
    }

    async fn create_or_update_vertex(
        &self,
        label: &T,
        edges: Option<EdgeMap<T, C>>,
    ) -> Result<bool> {
        bump(&self.counters.vertex_writes);
        self.inner.create_or_update_vertex(label, edges).await
    }

    async fn find_vertices(&self, predicate: LabelPredicate<'_, T>) -> Result<Vec<T>> {
        bump(&self.counters.scans);
        self.inner.find_vertices(predicate).await
    }

    async fn get_vertex_edges(&self, label: &T) -> Result<EdgeMap<T, C>> {
        bump(&self.counters.edge_reads);
        self.inner.get_vertex_edges(label).await
    }

    async fn get_vertex_attributes(&self, label: &T) -> Result<VertexAttributes> {
        bump(&self.counters.attribute_ops);
        self.inner.get_vertex_attributes(label).await
    }

    async fn update_vertex_attributes(
        &self,
        label: &T,
        attributes: VertexAttributes,
    ) -> Result<bool> {
        bump(&self.counters.attribute_ops);
        self.inner.update_vertex_attributes(label, attributes).await
    }

    async fn vertex_exists(&self, label: &T) -> Result<bool> {
        bump(&self.counters.existence_checks);
        self.inner.vertex_exists(label).await
    }

    async fn vertex_count(&self) -> Result<usize> {
        self.inner.vertex_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryGraphStore;

    #[tokio::test]
    async fn test_counts_calls() {
        let store = InstrumentedStore::new(InMemoryGraphStore::<String, f64>::new());
        let a = "a".to_string();

        store.create_or_update_vertex(&a, None).await.unwrap();
        store.get_vertex_edges(&a).await.unwrap();
        store.get_vertex_edges(&a).await.unwrap();
        store.vertex_exists(&a).await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.vertex_writes, 1);
        assert_eq!(stats.edge_reads, 2);
        assert_eq!(stats.existence_checks, 1);

        store.reset();
        assert_eq!(store.stats(), StoreStats::default());
    }
}
