//! JSON object serializer, the reference record format of the file store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use wgraph_core::ObjectSerializer;
use wgraph_core::error::Result;

/// Serializes records as JSON, compact by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output, easier to inspect by hand
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ObjectSerializer for JsonSerializer {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn serialize<V: Serialize>(&self, value: &V) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }

    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
