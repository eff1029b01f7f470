//! Storage backends for the wgraph weighted graph engine.
//!
//! This crate provides the implementations of
//! [`WeightedGraphStore`](wgraph_core::WeightedGraphStore):
//! - [`InMemoryGraphStore`]: map-backed, no I/O, for ephemeral graphs and tests
//! - [`FileGraphStore`]: one file per vertex plus a label index, guarded by a
//!   process-wide reader/writer lock per storage root
//! - [`InstrumentedStore`]: wraps any store and counts the calls made to it

pub mod file;
pub mod instrumented;
pub mod locks;
pub mod memory;
pub mod serializer;

pub use file::FileGraphStore;
pub use instrumented::{InstrumentedStore, StoreStats};
pub use locks::{PathLockRegistry, StoreLock};
pub use memory::InMemoryGraphStore;
pub use serializer::JsonSerializer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::file::FileGraphStore;
    pub use crate::instrumented::{InstrumentedStore, StoreStats};
    pub use crate::memory::InMemoryGraphStore;
    pub use crate::serializer::JsonSerializer;
}
