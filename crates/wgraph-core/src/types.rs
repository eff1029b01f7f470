//! Core types shared by the stores and the graph engine.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of a vertex.
///
/// Labels are the only key used across stores, nodes and path search. Labels
/// persisted by the file store must serialize as JSON map keys (strings or
/// integers).
pub trait VertexLabel:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> VertexLabel for T where
    T: Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Cost attached to a directed edge.
///
/// `Default` is the starting cost of a path search and `PartialOrd` is the
/// natural ordering used when no comparer is supplied.
pub trait EdgeCost:
    Clone + Default + PartialOrd + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<C> EdgeCost for C where
    C: Clone + Default + PartialOrd + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Outgoing edges of one vertex: target label -> cost.
pub type EdgeMap<T, C> = HashMap<T, C>;

/// Open attribute map persisted independently from edges.
pub type VertexAttributes = HashMap<String, serde_json::Value>;

/// Label -> file id mapping kept by the file store.
pub type VertexIndex<T> = HashMap<T, String>;

/// One persisted vertex as written by the file store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(bound(
    serialize = "T: Serialize + Eq + Hash, C: Serialize",
    deserialize = "T: DeserializeOwned + Eq + Hash, C: DeserializeOwned"
))]
pub struct VertexRecord<T, C> {
    pub id: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub label: T,
    pub edges: HashMap<T, C>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: VertexAttributes,
}

impl<T, C> VertexRecord<T, C>
where
    T: Eq + Hash,
{
    /// Create a new record with the given edges
    pub fn new(id: impl Into<String>, label: T, edges: HashMap<T, C>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created: now,
            modified: now,
            label,
            edges,
            attributes: HashMap::new(),
        }
    }

    /// Replace the edge set and bump the modification time
    pub fn replace_edges(&mut self, edges: HashMap<T, C>) {
        self.edges = edges;
        self.modified = Utc::now();
    }

    /// Replace the attributes and bump the modification time
    pub fn replace_attributes(&mut self, attributes: VertexAttributes) {
        self.attributes = attributes;
        self.modified = Utc::now();
    }
}
