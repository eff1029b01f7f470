//! Configuration for the graph engine and its stores.
//!
//! Configuration is read from a TOML file and can be overridden with
//! environment variables:
//!
//! ```text
//! WGRAPH_STORE_ROOT            root directory of the file store
//! WGRAPH_INDEX_FILE            name of the label index file
//! WGRAPH_DATA_EXTENSION        extension of vertex files
//! WGRAPH_READ_LOCK_TIMEOUT_MS  bounded wait for the store read lock
//! WGRAPH_LOG_LEVEL             trace, debug, info, warn, error
//! ```
//!
//! # Example
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [store]
//! root = "/var/lib/wgraph"
//! index_file = "index.json"
//! attributes_file = "attributes.json"
//! data_extension = ".jnod"
//! read_lock_timeout_ms = 5000
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

// Environment variable names
pub const ENV_STORE_ROOT: &str = "WGRAPH_STORE_ROOT";
pub const ENV_INDEX_FILE: &str = "WGRAPH_INDEX_FILE";
pub const ENV_DATA_EXTENSION: &str = "WGRAPH_DATA_EXTENSION";
pub const ENV_READ_LOCK_TIMEOUT_MS: &str = "WGRAPH_READ_LOCK_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "WGRAPH_LOG_LEVEL";

pub const DEFAULT_INDEX_FILE: &str = "index.json";
pub const DEFAULT_ATTRIBUTES_FILE: &str = "attributes.json";
pub const DEFAULT_DATA_EXTENSION: &str = ".jnod";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// File store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Storage root holding the index file and one file per vertex
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Name of the label -> file id index file
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Attributes of labels that have no vertex yet
    #[serde(default = "default_attributes_file")]
    pub attributes_file: String,
    /// Extension of vertex files, including the leading dot
    #[serde(default = "default_data_extension")]
    pub data_extension: String,
    /// How long a read waits for the store lock before proceeding without it
    #[serde(default = "default_read_lock_timeout_ms")]
    pub read_lock_timeout_ms: u64,
    /// Attempts at generating a collision-free file id
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,
    /// Write indented JSON
    #[serde(default)]
    pub pretty_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wgraph")
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

fn default_attributes_file() -> String {
    DEFAULT_ATTRIBUTES_FILE.to_string()
}

fn default_data_extension() -> String {
    DEFAULT_DATA_EXTENSION.to_string()
}

fn default_read_lock_timeout_ms() -> u64 {
    5000
}

fn default_max_id_attempts() -> u32 {
    64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            index_file: default_index_file(),
            attributes_file: default_attributes_file(),
            data_extension: default_data_extension(),
            read_lock_timeout_ms: default_read_lock_timeout_ms(),
            max_id_attempts: default_max_id_attempts(),
            pretty_json: false,
        }
    }
}

impl StoreConfig {
    /// Defaults rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn read_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.read_lock_timeout_ms)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    pub fn attributes_path(&self) -> PathBuf {
        self.root.join(&self.attributes_file)
    }

    /// Path of the vertex file for `file_id`
    pub fn vertex_path(&self, file_id: &str) -> PathBuf {
        self.root.join(format!("{}{}", file_id, self.data_extension))
    }

    /// Reject settings the file store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(GraphError::invalid_input("store root must not be empty"));
        }
        if self.index_file.trim().is_empty() {
            return Err(GraphError::invalid_input("index file name must not be empty"));
        }
        for name in [&self.index_file, &self.attributes_file] {
            if name.contains(['/', '\\']) {
                return Err(GraphError::invalid_input(format!(
                    "file name '{}' must not contain path separators",
                    name
                )));
            }
        }
        if self.attributes_file.trim().is_empty() {
            return Err(GraphError::invalid_input("attributes file name must not be empty"));
        }
        if self.attributes_file == self.index_file {
            return Err(GraphError::invalid_input(
                "attributes file must differ from the index file",
            ));
        }
        if !self.data_extension.starts_with('.') || self.data_extension.len() < 2 {
            return Err(GraphError::invalid_input(format!(
                "data extension '{}' must start with '.'",
                self.data_extension
            )));
        }
        if self.index_file.ends_with(&self.data_extension)
            || self.attributes_file.ends_with(&self.data_extension)
        {
            return Err(GraphError::invalid_input(
                "index and attributes files must not share the vertex data extension",
            ));
        }
        if self.max_id_attempts == 0 {
            return Err(GraphError::invalid_input("max_id_attempts must be at least 1"));
        }
        Ok(())
    }
}

impl GraphConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: GraphConfig = toml::from_str(&content)
            .map_err(|e| GraphError::config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given (defaults otherwise), then apply env overrides
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GraphError::config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_STORE_ROOT) {
            self.store.root = PathBuf::from(root);
        }
        if let Some(index) = lookup(ENV_INDEX_FILE) {
            self.store.index_file = index;
        }
        if let Some(ext) = lookup(ENV_DATA_EXTENSION) {
            self.store.data_extension = ext;
        }
        if let Some(timeout) = lookup(ENV_READ_LOCK_TIMEOUT_MS) {
            match timeout.parse() {
                Ok(ms) => self.store.read_lock_timeout_ms = ms,
                Err(_) => debug!("Ignoring invalid {}={}", ENV_READ_LOCK_TIMEOUT_MS, timeout),
            }
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.general.log_level = level.to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(GraphError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        self.store.validate()
    }
}
