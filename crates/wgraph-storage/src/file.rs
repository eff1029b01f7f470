//! File-backed graph store.
//!
//! Layout of a storage root:
//!
//! ```text
//! <root>/
//! ├── index.json        # label -> file id
//! ├── attributes.json   # label -> attributes, for labels with no vertex yet
//! ├── ber40211.jnod     # { Id, Created, Modified, Label, Edges, Attributes? }
//! └── par7730.jnod
//! ```
//!
//! File ids are generated (see [`FileId`]) so labels never reach the
//! filesystem. Every operation goes through the process-wide lock of the
//! storage root: writes hold it exclusively and rewrite both the vertex file
//! and the index, reads wait for it for a bounded time and then proceed
//! without it.
//!
//! Attributes written for an unknown label stay in the attributes file and
//! never create a vertex. They move into the vertex file when the vertex is
//! first created.

use crate::locks::{PathLockRegistry, StoreLock};
use crate::serializer::JsonSerializer;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use wgraph_core::error::{GraphError, Result};
use wgraph_core::{
    EdgeCost, EdgeMap, FileId, LabelPredicate, ObjectSerializer, StoreConfig, VertexAttributes,
    VertexIndex, VertexLabel, VertexRecord, WeightedGraphStore,
};

/// Store persisting one file per vertex plus a label index
pub struct FileGraphStore<T, C, S = JsonSerializer> {
    config: StoreConfig,
    serializer: S,
    lock: StoreLock,
    _marker: PhantomData<fn() -> (T, C)>,
}

impl<T: VertexLabel, C: EdgeCost> FileGraphStore<T, C, JsonSerializer> {
    /// Open (or create) a JSON store at `config.root`
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let serializer = if config.pretty_json {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };
        Self::with_serializer(config, serializer).await
    }

    /// Open a JSON store at `root` with default settings
    pub async fn open_at(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open(StoreConfig::with_root(root)).await
    }
}

impl<T: VertexLabel, C: EdgeCost, S: ObjectSerializer> FileGraphStore<T, C, S> {
    /// Open (or create) a store using a custom record serializer
    pub async fn with_serializer(config: StoreConfig, serializer: S) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.root).await?;
        let lock = PathLockRegistry::global().lock_for(&config.root);

        info!(
            "Opened file graph store at {} ({} records)",
            config.root.display(),
            serializer.format_name()
        );

        Ok(Self {
            config,
            serializer,
            lock,
            _marker: PhantomData,
        })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path of the vertex file backing `label`, if the index knows it
    pub async fn vertex_file(&self, label: &T) -> Result<Option<PathBuf>> {
        let _guard = self.lock.read_bounded(self.config.read_lock_timeout()).await;
        let index = self.read_index().await?;
        Ok(index.get(label).map(|id| self.config.vertex_path(id)))
    }

    async fn read_index(&self) -> Result<VertexIndex<T>> {
        match fs::read(self.config.index_path()).await {
            Ok(bytes) => self.serializer.deserialize(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(VertexIndex::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, index: &VertexIndex<T>) -> Result<()> {
        let bytes = self.serializer.serialize(index)?;
        write_replace(&self.config.index_path(), &bytes).await
    }

    async fn read_detached(&self) -> Result<HashMap<T, VertexAttributes>> {
        match fs::read(self.config.attributes_path()).await {
            Ok(bytes) => self.serializer.deserialize(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_detached(&self, detached: &HashMap<T, VertexAttributes>) -> Result<()> {
        if detached.is_empty() {
            return match fs::remove_file(self.config.attributes_path()).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }
        let bytes = self.serializer.serialize(detached)?;
        write_replace(&self.config.attributes_path(), &bytes).await
    }

    async fn read_record(&self, file_id: &str) -> Result<VertexRecord<T, C>> {
        let path = self.config.vertex_path(file_id);
        match fs::read(&path).await {
            Ok(bytes) => self.serializer.deserialize(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(GraphError::not_found(
                "VertexFile",
                path.display().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, record: &VertexRecord<T, C>) -> Result<()> {
        let bytes = self.serializer.serialize(record)?;
        write_replace(&self.config.vertex_path(&record.id), &bytes).await
    }

    /// Try random ids until one is free in the index and on disk
    async fn allocate_id(&self, label: &T, index: &VertexIndex<T>) -> Result<String> {
        self.allocate_id_with(label, index, FileId::generate).await
    }

    async fn allocate_id_with<F>(
        &self,
        label: &T,
        index: &VertexIndex<T>,
        mut candidate: F,
    ) -> Result<String>
    where
        F: FnMut(&str) -> FileId,
    {
        let label_json = serde_json::to_string(label)?;
        let taken: HashSet<&str> = index.values().map(String::as_str).collect();

        for _ in 0..self.config.max_id_attempts {
            let id = candidate(&label_json);
            if taken.contains(id.as_str()) {
                continue;
            }
            if !fs::try_exists(self.config.vertex_path(id.as_str())).await? {
                return Ok(id.into());
            }
        }

        Err(GraphError::storage(format!(
            "No free file id for {:?} after {} attempts",
            label, self.config.max_id_attempts
        )))
    }

    /// Load the record for `label` or start a fresh one, registering new ids in `index`
    async fn load_or_new_record(
        &self,
        label: &T,
        index: &mut VertexIndex<T>,
    ) -> Result<VertexRecord<T, C>> {
        if let Some(id) = index.get(label).cloned() {
            match self.read_record(&id).await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_not_found() => {
                    debug!("Index entry {} for {:?} has no file, recreating", id, label);
                    return Ok(VertexRecord::new(id, label.clone(), EdgeMap::new()));
                }
                Err(e) => return Err(e),
            }
        }

        let id = self.allocate_id(label, index).await?;
        index.insert(label.clone(), id.clone());
        Ok(VertexRecord::new(id, label.clone(), EdgeMap::new()))
    }
}

/// Write through a sibling temp file so readers never observe a torn file
async fn write_replace(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl<T, C, S> WeightedGraphStore<T, C> for FileGraphStore<T, C, S>
where
    T: VertexLabel,
    C: EdgeCost,
    S: ObjectSerializer,
{
    async fn delete_all_data(&self) -> Result<bool> {
        let _guard = self.lock.write().await;

        let mut removed = 0usize;
        let mut entries = match fs::read_dir(&self.config.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let base = name.strip_suffix(".tmp").unwrap_or(&*name);
            if base.ends_with(&self.config.data_extension)
                || base == self.config.index_file
                || base == self.config.attributes_file
            {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        info!(
            "Deleted all graph data at {} ({} files)",
            self.config.root.display(),
            removed
        );
        Ok(true)
    }

    async fn create_or_update_vertex(
        &self,
        label: &T,
        edges: Option<EdgeMap<T, C>>,
    ) -> Result<bool> {
        let _guard = self.lock.write().await;

        let mut index = self.read_index().await?;
        let is_new = !index.contains_key(label);
        let mut record = self.load_or_new_record(label, &mut index).await?;
        record.replace_edges(edges.unwrap_or_default());

        let mut detached = if is_new {
            self.read_detached().await?
        } else {
            HashMap::new()
        };
        let adopted = match detached.remove(label) {
            Some(attributes) => {
                record.replace_attributes(attributes);
                true
            }
            None => false,
        };

        self.write_record(&record).await?;
        self.write_index(&index).await?;
        if adopted {
            self.write_detached(&detached).await?;
            debug!("Moved detached attributes of {:?} into {}", label, record.id);
        }

        debug!(
            "Wrote vertex {:?} to {} ({} edges)",
            label,
            record.id,
            record.edges.len()
        );
        Ok(true)
    }

    async fn find_vertices(&self, predicate: LabelPredicate<'_, T>) -> Result<Vec<T>> {
        let _guard = self.lock.read_bounded(self.config.read_lock_timeout()).await;
        let index = self.read_index().await?;
        Ok(index.into_keys().filter(|label| predicate(label)).collect())
    }

    async fn get_vertex_edges(&self, label: &T) -> Result<EdgeMap<T, C>> {
        let _guard = self.lock.read_bounded(self.config.read_lock_timeout()).await;
        let index = self.read_index().await?;
        let id = index
            .get(label)
            .ok_or_else(|| GraphError::vertex_not_found(label))?;
        Ok(self.read_record(id).await?.edges)
    }

    async fn get_vertex_attributes(&self, label: &T) -> Result<VertexAttributes> {
        let _guard = self.lock.read_bounded(self.config.read_lock_timeout()).await;
        let index = self.read_index().await?;
        match index.get(label) {
            Some(id) => Ok(self.read_record(id).await?.attributes),
            None => Ok(self.read_detached().await?.remove(label).unwrap_or_default()),
        }
    }

    async fn update_vertex_attributes(
        &self,
        label: &T,
        attributes: VertexAttributes,
    ) -> Result<bool> {
        let _guard = self.lock.write().await;

        let index = self.read_index().await?;
        if let Some(id) = index.get(label) {
            let mut record = match self.read_record(id).await {
                Ok(record) => record,
                Err(e) if e.is_not_found() => {
                    VertexRecord::new(id.clone(), label.clone(), EdgeMap::new())
                }
                Err(e) => return Err(e),
            };
            record.replace_attributes(attributes);
            self.write_record(&record).await?;
            return Ok(true);
        }

        let mut detached = self.read_detached().await?;
        detached.insert(label.clone(), attributes);
        self.write_detached(&detached).await?;
        debug!("Stored detached attributes for {:?}", label);
        Ok(true)
    }

    async fn vertex_exists(&self, label: &T) -> Result<bool> {
        let _guard = self.lock.read_bounded(self.config.read_lock_timeout()).await;
        Ok(self.read_index().await?.contains_key(label))
    }

    async fn vertex_count(&self) -> Result<usize> {
        let _guard = self.lock.read_bounded(self.config.read_lock_timeout()).await;
        Ok(self.read_index().await?.len())
    }
}
