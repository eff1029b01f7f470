//! Error types for the weighted graph engine.

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Main error type for the graph engine and its stores.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A vertex (or other resource) the store does not know about
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Operation not valid in the current graph state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid argument or construction input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage layer errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GraphError {
    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a not found error for a vertex label
    pub fn vertex_not_found(label: &impl std::fmt::Debug) -> Self {
        Self::not_found("Vertex", format!("{:?}", label))
    }

    /// Create a new invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invalid operation error
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
