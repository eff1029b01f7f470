//! The weighted graph: store handle, working set and path search.

use crate::accumulator::CostAccumulator;
use crate::node::GraphNode;
use crate::search::{OptimalPathSearch, PathStep};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use wgraph_core::error::Result;
use wgraph_core::{
    CostComparer, EdgeCost, LabelPredicate, VertexAttributes, VertexLabel, WeightedGraphStore,
};
use wgraph_storage::InMemoryGraphStore;

/// Directed graph of labeled vertices backed by a [`WeightedGraphStore`].
///
/// The graph owns the state of every vertex materialized since the last
/// [`save`](Self::save), keyed by label. Vertices created or mutated here are
/// written to the store only by `save`.
pub struct WeightedGraph<T, C> {
    store: Arc<dyn WeightedGraphStore<T, C>>,
    accumulator: CostAccumulator<C>,
    nodes: DashMap<T, GraphNode<T, C>>,
    version: AtomicU64,
    search: OnceCell<OptimalPathSearch<T, C>>,
}

impl<T: VertexLabel, C: EdgeCost> WeightedGraph<T, C> {
    pub fn new(store: Arc<dyn WeightedGraphStore<T, C>>, accumulator: CostAccumulator<C>) -> Self {
        Self {
            store,
            accumulator,
            nodes: DashMap::new(),
            version: AtomicU64::new(0),
            search: OnceCell::new(),
        }
    }

    /// Ephemeral graph over a fresh in-memory store
    pub fn in_memory(accumulator: CostAccumulator<C>) -> Self {
        Self::new(Arc::new(InMemoryGraphStore::new()), accumulator)
    }

    pub fn store(&self) -> &Arc<dyn WeightedGraphStore<T, C>> {
        &self.store
    }

    pub fn accumulator(&self) -> &CostAccumulator<C> {
        &self.accumulator
    }

    /// Modification counter, bumped by every vertex creation and edge mutation
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Number of vertices held in memory
    pub fn working_set_len(&self) -> usize {
        self.nodes.len()
    }

    /// Vertices with changes not yet written to the store
    pub fn pending_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.value().needs_flush()).count()
    }

    /// Look up a vertex.
    ///
    /// Returns the in-memory node when there is one. Otherwise, with
    /// `validate_integrity`, the store must confirm the vertex exists before a
    /// node is materialized; without it the node is materialized directly.
    pub async fn find_vertex(&self, label: &T, validate_integrity: bool) -> Result<Option<GraphNode<T, C>>> {
        let cached = self.nodes.get(label).map(|n| n.value().clone());
        if let Some(node) = cached {
            return Ok(Some(node));
        }

        if validate_integrity && !self.store.vertex_exists(label).await? {
            return Ok(None);
        }

        Ok(Some(self.materialize(label)))
    }

    /// Look up a vertex, creating it when the store does not know it.
    ///
    /// The existence check and the creation are not atomic against the store:
    /// two graphs creating the same new label both see it as new, and the
    /// later save wins.
    pub async fn find_or_create_vertex(&self, label: &T) -> Result<GraphNode<T, C>> {
        let cached = self.nodes.get(label).map(|n| n.value().clone());
        if let Some(node) = cached {
            return Ok(node);
        }

        if self.store.vertex_exists(label).await? {
            return Ok(self.materialize(label));
        }

        let (node, created) = match self.nodes.entry(label.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let node = GraphNode::created(label.clone());
                entry.insert(node.clone());
                (node, true)
            }
        };

        if created {
            debug!("Created vertex {:?}", label);
            self.notify_modified();
        }
        Ok(node)
    }

    fn materialize(&self, label: &T) -> GraphNode<T, C> {
        self.nodes
            .entry(label.clone())
            .or_insert_with(|| GraphNode::unloaded(label.clone()))
            .value()
            .clone()
    }

    /// Called by a node after it buffered an edge mutation
    pub(crate) fn on_node_modified(&self, node: &GraphNode<T, C>) {
        match self.nodes.entry(node.label().clone()) {
            Entry::Vacant(entry) => {
                entry.insert(node.clone());
            }
            Entry::Occupied(mut entry) => {
                if !entry.get().ptr_eq(node) {
                    if entry.get().needs_flush() {
                        warn!(
                            "Vertex {:?} modified through a stale handle; pending changes of the current node are kept",
                            node.label()
                        );
                    } else {
                        entry.insert(node.clone());
                    }
                }
            }
        }
        self.notify_modified();
    }

    /// Record a modification and invalidate cached path results
    pub fn notify_modified(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
        if let Some(search) = self.search.get() {
            search.clear_cache();
        }
    }

    /// Flush every pending vertex to the store.
    ///
    /// Returns the number of vertices written. Flushed vertices leave the
    /// working set. A failure stops the flush: vertices written before it stay
    /// written, the rest stay pending.
    pub async fn save(&self) -> Result<usize> {
        let nodes: Vec<GraphNode<T, C>> = self.nodes.iter().map(|n| n.value().clone()).collect();

        let mut flushed = 0;
        for node in nodes {
            if node.save(self).await? {
                flushed += 1;
            }
            self.nodes
                .remove_if(node.label(), |_, current| current.ptr_eq(&node) && !current.needs_flush());
        }

        info!(
            "Saved {} vertices ({} still in memory)",
            flushed,
            self.nodes.len()
        );
        Ok(flushed)
    }

    /// The path search instance, created on first use
    pub fn path_search(&self) -> &OptimalPathSearch<T, C> {
        self.search
            .get_or_init(|| OptimalPathSearch::new(self.accumulator.clone()))
    }

    /// Lowest-cost path from `start` to `end` under `comparer` (natural order by default)
    pub async fn find_best_path(
        &self,
        start: &T,
        end: &T,
        comparer: Option<&CostComparer<C>>,
    ) -> Result<Option<Vec<PathStep<T, C>>>> {
        self.path_search().find_best_path(self, start, end, comparer).await
    }

    /// Labels in the store matching `predicate`
    pub async fn find_vertices(&self, predicate: LabelPredicate<'_, T>) -> Result<Vec<T>> {
        self.store.find_vertices(predicate).await
    }

    pub async fn vertex_attributes(&self, label: &T) -> Result<VertexAttributes> {
        self.store.get_vertex_attributes(label).await
    }

    /// Attributes are written straight through; they do not affect path search
    pub async fn update_vertex_attributes(&self, label: &T, attributes: VertexAttributes) -> Result<bool> {
        self.store.update_vertex_attributes(label, attributes).await
    }

    /// Wipe the store, the working set and cached paths
    pub async fn delete_all_data(&self) -> Result<bool> {
        let deleted = self.store.delete_all_data().await?;
        self.nodes.clear();
        self.notify_modified();
        Ok(deleted)
    }
}
