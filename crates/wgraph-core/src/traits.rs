//! Core traits defining the persistence seams of the graph engine.

use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Predicate evaluated against the label index of a store.
pub type LabelPredicate<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// Storage-agnostic contract for vertex persistence.
///
/// Implementations must be safe for concurrent calls on different labels;
/// same-label concurrency is serialized by the implementation itself.
#[async_trait]
pub trait WeightedGraphStore<T: VertexLabel, C: EdgeCost>: Send + Sync {
    /// Remove all persisted vertices and edges. Idempotent.
    async fn delete_all_data(&self) -> Result<bool>;

    /// Upsert a vertex with its full edge set (`None` stores an empty set)
    async fn create_or_update_vertex(&self, label: &T, edges: Option<EdgeMap<T, C>>)
    -> Result<bool>;

    /// Labels satisfying `predicate`, evaluated over the label index only
    async fn find_vertices(&self, predicate: LabelPredicate<'_, T>) -> Result<Vec<T>>;

    /// Outgoing edges of a vertex.
    ///
    /// Fails with [`GraphError::NotFound`](crate::GraphError::NotFound) when
    /// the vertex does not exist.
    async fn get_vertex_edges(&self, label: &T) -> Result<EdgeMap<T, C>>;

    /// Attributes of a vertex (empty when none were stored)
    async fn get_vertex_attributes(&self, label: &T) -> Result<VertexAttributes>;

    /// Replace the attributes of a vertex
    async fn update_vertex_attributes(&self, label: &T, attributes: VertexAttributes)
    -> Result<bool>;

    /// Check whether the store knows the vertex
    async fn vertex_exists(&self, label: &T) -> Result<bool>;

    /// Number of stored vertices
    async fn vertex_count(&self) -> Result<usize> {
        Ok(self.find_vertices(&|_: &T| true).await?.len())
    }
}

/// Pluggable object serializer used by file-backed stores.
pub trait ObjectSerializer: Send + Sync + 'static {
    /// Short name of the format, used in log output
    fn format_name(&self) -> &'static str;

    /// Serialize a value to bytes
    fn serialize<V: Serialize>(&self, value: &V) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V>;
}
