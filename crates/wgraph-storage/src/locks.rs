//! Process-wide reader/writer locks for file-backed stores.
//!
//! Every store instance opened on the same storage root shares one lock, so
//! file access is serialized across the whole process and not just within a
//! single store value.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, warn};

static REGISTRY: Lazy<PathLockRegistry> = Lazy::new(PathLockRegistry::new);

/// Registry of locks keyed by canonical storage root.
#[derive(Debug, Default)]
pub struct PathLockRegistry {
    locks: DashMap<PathBuf, StoreLock>,
}

impl PathLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static PathLockRegistry {
        &REGISTRY
    }

    /// Lock for `root`, created on first use
    pub fn lock_for(&self, root: &Path) -> StoreLock {
        let key = canonical_key(root);
        self.locks
            .entry(key)
            .or_insert_with(|| {
                debug!("Creating store lock for {}", root.display());
                StoreLock::new()
            })
            .clone()
    }

    /// Number of distinct roots with a lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

fn canonical_key(root: &Path) -> PathBuf {
    match root.canonicalize() {
        Ok(path) => path,
        Err(_) if root.is_absolute() => root.to_path_buf(),
        Err(_) => std::env::current_dir()
            .map(|cwd| cwd.join(root))
            .unwrap_or_else(|_| root.to_path_buf()),
    }
}

/// Shared reader/writer lock guarding one storage root.
#[derive(Debug, Clone, Default)]
pub struct StoreLock {
    inner: Arc<RwLock<()>>,
}

impl StoreLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access for writes
    pub async fn write(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.inner).write_owned().await
    }

    /// Shared access, waiting at most `timeout`.
    ///
    /// Returns `None` when the wait elapses; the caller proceeds without the
    /// lock.
    pub async fn read_bounded(&self, timeout: Duration) -> Option<OwnedRwLockReadGuard<()>> {
        match tokio::time::timeout(timeout, Arc::clone(&self.inner).read_owned()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(
                    "Store read lock not acquired within {}ms, proceeding without it",
                    timeout.as_millis()
                );
                None
            }
        }
    }

    /// True when both handles guard the same root
    pub fn same_lock(&self, other: &StoreLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
