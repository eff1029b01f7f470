//! Graph vertices.
//!
//! A [`GraphNode`] is a cheap handle to vertex state owned by the graph's
//! arena. Operations that need the graph (lazy loading, resolving neighbors,
//! change notification) take it as a borrowed parameter instead of keeping a
//! back-reference.
//!
//! Per node:
//! - load state: Unloaded -> Loading -> Loaded, at most one store read
//! - dirty flag: set by every edge mutation, cleared by a successful save

use crate::graph::WeightedGraph;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use wgraph_core::error::{GraphError, Result};
use wgraph_core::{EdgeCost, EdgeMap, VertexLabel};

struct EdgeBuffer<T, C> {
    edges: EdgeMap<T, C>,
    loaded: bool,
}

struct VertexState<T, C> {
    label: T,
    buffer: RwLock<EdgeBuffer<T, C>>,
    loaded: AtomicBool,
    dirty: AtomicBool,
    is_new: AtomicBool,
}

/// Handle to one vertex of a [`WeightedGraph`]
pub struct GraphNode<T, C> {
    state: Arc<VertexState<T, C>>,
}

impl<T: VertexLabel, C: EdgeCost> GraphNode<T, C> {
    /// Node for a vertex the store already knows; edges load on first access
    pub(crate) fn unloaded(label: T) -> Self {
        Self::with_state(label, false, false)
    }

    /// Node for a vertex that does not exist in the store yet
    pub(crate) fn created(label: T) -> Self {
        Self::with_state(label, true, true)
    }

    fn with_state(label: T, loaded: bool, is_new: bool) -> Self {
        Self {
            state: Arc::new(VertexState {
                label,
                buffer: RwLock::new(EdgeBuffer {
                    edges: EdgeMap::new(),
                    loaded,
                }),
                loaded: AtomicBool::new(loaded),
                dirty: AtomicBool::new(false),
                is_new: AtomicBool::new(is_new),
            }),
        }
    }

    pub fn label(&self) -> &T {
        &self.state.label
    }

    /// True while edge mutations are buffered but not confirmed written
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::Acquire)
    }

    /// True for a vertex created in memory and not yet persisted
    pub fn is_new(&self) -> bool {
        self.state.is_new.load(Ordering::Acquire)
    }

    /// True once the edge set has been loaded (or never needed loading)
    pub fn is_loaded(&self) -> bool {
        self.state.loaded.load(Ordering::Acquire)
    }

    /// True when both handles refer to the same vertex state
    pub fn ptr_eq(&self, other: &GraphNode<T, C>) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Whether `save` would write anything
    pub(crate) fn needs_flush(&self) -> bool {
        self.is_dirty() || self.is_new()
    }

    async fn ensure_loaded(&self, graph: &WeightedGraph<T, C>) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let mut buffer = self.state.buffer.write().await;
        if buffer.loaded {
            return Ok(());
        }

        let stored = graph.store().get_vertex_edges(self.label()).await?;
        let stored_count = stored.len();
        // Edges connected before the first load win over persisted values
        for (target, cost) in stored {
            buffer.edges.entry(target).or_insert(cost);
        }
        buffer.loaded = true;
        self.state.loaded.store(true, Ordering::Release);

        debug!(
            "Loaded {} edges for {:?} ({} buffered)",
            stored_count,
            self.label(),
            buffer.edges.len()
        );
        Ok(())
    }

    /// Outgoing edges as a label -> cost map
    pub async fn edge_map(&self, graph: &WeightedGraph<T, C>) -> Result<EdgeMap<T, C>> {
        self.ensure_loaded(graph).await?;
        Ok(self.state.buffer.read().await.edges.clone())
    }

    /// Outgoing edges resolved to neighbor nodes
    pub async fn get_edges(&self, graph: &WeightedGraph<T, C>) -> Result<Vec<(GraphNode<T, C>, C)>> {
        let edges = self.edge_map(graph).await?;
        let mut resolved = Vec::with_capacity(edges.len());
        for (target, cost) in edges {
            // An edge implies the target exists
            if let Some(node) = graph.find_vertex(&target, false).await? {
                resolved.push((node, cost));
            }
        }
        Ok(resolved)
    }

    /// Cost of the edge to `target`, if any
    pub async fn edge_cost(&self, graph: &WeightedGraph<T, C>, target: &T) -> Result<Option<C>> {
        self.ensure_loaded(graph).await?;
        Ok(self.state.buffer.read().await.edges.get(target).cloned())
    }

    /// Create or overwrite the edge to `target`
    pub async fn connect_to(&self, graph: &WeightedGraph<T, C>, target: T, cost: C) -> Result<()> {
        self.upsert_edge(graph, target, move |_| cost).await
    }

    /// Set the edge to `modifier(existing cost, or initial when absent)`
    pub async fn connect_to_or_modify_weight<F>(
        &self,
        graph: &WeightedGraph<T, C>,
        target: T,
        initial: C,
        modifier: F,
    ) -> Result<()>
    where
        F: FnOnce(&C) -> C,
    {
        self.upsert_edge(graph, target, move |existing| {
            modifier(existing.unwrap_or(&initial))
        })
        .await
    }

    async fn upsert_edge<F>(&self, graph: &WeightedGraph<T, C>, target: T, cost_for: F) -> Result<()>
    where
        F: FnOnce(Option<&C>) -> C,
    {
        self.ensure_loaded(graph).await?;
        graph.find_or_create_vertex(&target).await?;

        {
            let mut buffer = self.state.buffer.write().await;
            let cost = cost_for(buffer.edges.get(&target));
            buffer.edges.insert(target, cost);
            self.state.dirty.store(true, Ordering::Release);
        }

        graph.on_node_modified(self);
        Ok(())
    }

    /// Apply `increment` to an existing edge.
    ///
    /// Fails with [`GraphError::InvalidOperation`] when there is no edge to
    /// `target` yet.
    pub async fn increment_weight<F>(
        &self,
        graph: &WeightedGraph<T, C>,
        target: &T,
        increment: F,
    ) -> Result<()>
    where
        F: FnOnce(&C) -> C,
    {
        self.ensure_loaded(graph).await?;

        {
            let mut buffer = self.state.buffer.write().await;
            let cost = buffer.edges.get_mut(target).ok_or_else(|| {
                GraphError::invalid_operation(format!(
                    "no edge from {:?} to {:?} to increment",
                    self.label(),
                    target
                ))
            })?;
            *cost = increment(cost);
            self.state.dirty.store(true, Ordering::Release);
        }

        graph.on_node_modified(self);
        Ok(())
    }

    /// Remove the edge to `target`, returning its cost
    pub async fn disconnect_from(&self, graph: &WeightedGraph<T, C>, target: &T) -> Result<Option<C>> {
        self.ensure_loaded(graph).await?;

        let removed = {
            let mut buffer = self.state.buffer.write().await;
            let removed = buffer.edges.remove(target);
            if removed.is_some() {
                self.state.dirty.store(true, Ordering::Release);
            }
            removed
        };

        if removed.is_some() {
            graph.on_node_modified(self);
        }
        Ok(removed)
    }

    /// Write the buffered edge set to the store.
    ///
    /// Returns `false` without touching the store when there is nothing to
    /// write. A vertex that was created in memory is written once even without
    /// edge mutations. On failure the node stays dirty.
    pub async fn save(&self, graph: &WeightedGraph<T, C>) -> Result<bool> {
        if !self.needs_flush() {
            return Ok(false);
        }

        let (snapshot, was_dirty, was_new) = {
            let buffer = self.state.buffer.write().await;
            let was_dirty = self.state.dirty.swap(false, Ordering::AcqRel);
            let was_new = self.state.is_new.swap(false, Ordering::AcqRel);
            if !was_dirty && !was_new {
                return Ok(false);
            }
            (buffer.edges.clone(), was_dirty, was_new)
        };

        let edge_count = snapshot.len();
        if let Err(e) = graph
            .store()
            .create_or_update_vertex(self.label(), Some(snapshot))
            .await
        {
            if was_dirty {
                self.state.dirty.store(true, Ordering::Release);
            }
            if was_new {
                self.state.is_new.store(true, Ordering::Release);
            }
            return Err(e);
        }

        debug!("Saved {:?} ({} edges)", self.label(), edge_count);
        Ok(true)
    }
}

impl<T, C> Clone for GraphNode<T, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for GraphNode<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("label", &self.state.label)
            .field("loaded", &self.state.loaded.load(Ordering::Relaxed))
            .field("dirty", &self.state.dirty.load(Ordering::Relaxed))
            .field("new", &self.state.is_new.load(Ordering::Relaxed))
            .finish()
    }
}
