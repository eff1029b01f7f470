//! Weighted graph engine.
//!
//! A directed graph of labeled vertices with typed, orderable edge costs,
//! backed by any [`WeightedGraphStore`](wgraph_core::WeightedGraphStore).
//!
//! - Vertex edge sets are loaded lazily, at most once per node.
//! - Edge mutations are buffered in the node and written on [`WeightedGraph::save`].
//! - [`OptimalPathSearch`] memoizes cost tables per start vertex and comparer;
//!   any graph modification invalidates them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wgraph_engine::{CostAccumulator, WeightedGraph};
//! use wgraph_storage::InMemoryGraphStore;
//!
//! # async fn example() -> wgraph_core::Result<()> {
//! let store = Arc::new(InMemoryGraphStore::<String, f64>::new());
//! let graph: WeightedGraph<String, f64> = WeightedGraph::new(store, CostAccumulator::additive());
//!
//! let a = graph.find_or_create_vertex(&"A".to_string()).await?;
//! a.connect_to(&graph, "B".to_string(), 1.0).await?;
//! graph.save().await?;
//!
//! let path = graph.find_best_path(&"A".to_string(), &"B".to_string(), None).await?;
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod graph;
pub mod node;
pub mod search;

pub use accumulator::CostAccumulator;
pub use graph::WeightedGraph;
pub use node::GraphNode;
pub use search::{CostEntry, CostTable, OptimalPathSearch, PathStep};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::accumulator::CostAccumulator;
    pub use crate::graph::WeightedGraph;
    pub use crate::node::GraphNode;
    pub use crate::search::{OptimalPathSearch, PathStep};
    pub use wgraph_core::prelude::*;
}
