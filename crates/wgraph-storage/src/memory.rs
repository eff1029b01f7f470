//! In-memory graph store.
//!
//! Map-backed store with no I/O. Suitable as the default store for ephemeral
//! graphs and for tests. Each map lock is held only for the duration of a
//! single map operation; callers coordinating multi-step updates provide
//! their own discipline.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use wgraph_core::error::{GraphError, Result};
use wgraph_core::{EdgeCost, EdgeMap, LabelPredicate, VertexAttributes, VertexLabel, WeightedGraphStore};

/// Store keeping edges and attributes in two maps
pub struct InMemoryGraphStore<T, C> {
    edges: RwLock<HashMap<T, EdgeMap<T, C>>>,
    attributes: RwLock<HashMap<T, VertexAttributes>>,
}

impl<T: VertexLabel, C: EdgeCost> InMemoryGraphStore<T, C> {
    pub fn new() -> Self {
        Self {
            edges: RwLock::new(HashMap::new()),
            attributes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored vertices
    pub fn len(&self) -> usize {
        self.edges.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.read().is_empty()
    }
}

impl<T: VertexLabel, C: EdgeCost> Default for InMemoryGraphStore<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: VertexLabel, C: EdgeCost> WeightedGraphStore<T, C> for InMemoryGraphStore<T, C> {
    async fn delete_all_data(&self) -> Result<bool> {
        let removed = {
            let mut edges = self.edges.write();
            let removed = edges.len();
            edges.clear();
            removed
        };
        self.attributes.write().clear();
        debug!("Cleared in-memory store ({} vertices)", removed);
        Ok(true)
    }

    async fn create_or_update_vertex(
        &self,
        label: &T,
        edges: Option<EdgeMap<T, C>>,
    ) -> Result<bool> {
        self.edges
            .write()
            .insert(label.clone(), edges.unwrap_or_default());
        Ok(true)
    }

    async fn find_vertices(&self, predicate: LabelPredicate<'_, T>) -> Result<Vec<T>> {
        Ok(self
            .edges
            .read()
            .keys()
            .filter(|label| predicate(label))
            .cloned()
            .collect())
    }

    async fn get_vertex_edges(&self, label: &T) -> Result<EdgeMap<T, C>> {
        self.edges
            .read()
            .get(label)
            .cloned()
            .ok_or_else(|| GraphError::vertex_not_found(label))
    }

    async fn get_vertex_attributes(&self, label: &T) -> Result<VertexAttributes> {
        Ok(self
            .attributes
            .read()
            .get(label)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_vertex_attributes(
        &self,
        label: &T,
        attributes: VertexAttributes,
    ) -> Result<bool> {
        self.attributes.write().insert(label.clone(), attributes);
        Ok(true)
    }

    async fn vertex_exists(&self, label: &T) -> Result<bool> {
        Ok(self.edges.read().contains_key(label))
    }

    async fn vertex_count(&self) -> Result<usize> {
        Ok(self.len())
    }
}
