//! Core types and abstractions for the wgraph weighted graph engine.
//!
//! This crate provides the foundational types, traits, and error handling
//! shared by the storage backends and the graph engine.

pub mod comparer;
pub mod config;
pub mod error;
pub mod id;
pub mod traits;
pub mod types;

pub use comparer::{ComparerId, CostComparer};
pub use config::{GeneralConfig, GraphConfig, StoreConfig};
pub use error::{GraphError, Result};
pub use id::FileId;
pub use traits::*;
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::comparer::{ComparerId, CostComparer};
    pub use crate::config::{GraphConfig, StoreConfig};
    pub use crate::error::{GraphError, Result};
    pub use crate::traits::*;
    pub use crate::types::*;
}
