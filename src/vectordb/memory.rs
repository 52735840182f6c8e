use std::collections::BTreeMap;
use std::ops::Bound;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::error::VectorDbError;
use super::model::{
    DocumentRecord, ScanCursor, ScanPage, SearchHit, StoredDocument, cosine_similarity,
};
use super::store::VectorStore;
use crate::filter::MetadataFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryDocument {
    text: String,
    metadata: Map<String, Value>,
    vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryCollection {
    dimension: usize,
    metadata: Map<String, Value>,
    /// Keyed by document id; iteration order is the engine order.
    documents: BTreeMap<String, MemoryDocument>,
}

impl MemoryCollection {
    fn matching<'a>(
        &'a self,
        filter: Option<&'a MetadataFilter>,
    ) -> impl Iterator<Item = (&'a String, &'a MemoryDocument)> + 'a {
        self.documents
            .iter()
            .filter(move |(_, doc)| filter.is_none_or(|f| f.matches(&doc.metadata)))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: BTreeMap<String, MemoryCollection>,
}

/// In-process [`VectorStore`] with exact (brute-force) cosine search.
///
/// Cheap to clone; clones share state. State can be persisted with
/// [`save_snapshot`](MemoryStore::save_snapshot) and restored with
/// [`load_snapshot`](MemoryStore::load_snapshot).
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, MemoryCollection>>>,
}

fn not_found(name: &str) -> VectorDbError {
    VectorDbError::CollectionNotFound {
        collection: name.to_string(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `name`, if it exists.
    pub fn document_count(&self, name: &str) -> Option<usize> {
        self.collections.read().get(name).map(|c| c.documents.len())
    }

    /// Replaces the current state with the snapshot at `path`.
    ///
    /// A missing file is not an error; the store stays empty. Returns the number of
    /// collections loaded.
    pub fn load_snapshot(&self, path: &Path) -> Result<usize, VectorDbError> {
        let snapshot_err = |message: String| VectorDbError::Snapshot {
            path: path.to_path_buf(),
            message,
        };

        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(0);
        }

        let bytes = std::fs::read(path).map_err(|e| snapshot_err(e.to_string()))?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| snapshot_err(e.to_string()))?;

        let loaded = snapshot.collections.len();
        *self.collections.write() = snapshot.collections;

        info!(path = %path.display(), collections = loaded, "Snapshot loaded");
        Ok(loaded)
    }

    /// Writes the current state to `path` atomically (temp file + rename).
    pub fn save_snapshot(&self, path: &Path) -> Result<(), VectorDbError> {
        let snapshot_err = |message: String| VectorDbError::Snapshot {
            path: path.to_path_buf(),
            message,
        };

        let bytes = {
            let collections = self.collections.read();
            let snapshot = SnapshotRef {
                collections: &collections,
            };
            serde_json::to_vec(&snapshot).map_err(|e| snapshot_err(e.to_string()))?
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| snapshot_err(e.to_string()))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| snapshot_err(e.to_string()))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| snapshot_err(e.to_string()))?;
        tmp.persist(path)
            .map_err(|e| snapshot_err(e.error.to_string()))?;

        info!(path = %path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    collections: &'a BTreeMap<String, MemoryCollection>,
}

impl VectorStore for MemoryStore {
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(VectorDbError::CollectionExists {
                collection: name.to_string(),
            });
        }

        collections.insert(
            name.to_string(),
            MemoryCollection {
                dimension,
                metadata,
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        Ok(self.collections.read().contains_key(name))
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        Ok(self.collections.read().keys().cloned().collect())
    }

    async fn collection_metadata(&self, name: &str) -> Result<Map<String, Value>, VectorDbError> {
        self.collections
            .read()
            .get(name)
            .map(|c| c.metadata.clone())
            .ok_or_else(|| not_found(name))
    }

    async fn set_collection_metadata(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        let mut collections = self.collections.write();
        let coll = collections.get_mut(name).ok_or_else(|| not_found(name))?;
        coll.metadata = metadata;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.collections
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    async fn count(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<u64, VectorDbError> {
        let collections = self.collections.read();
        let coll = collections.get(name).ok_or_else(|| not_found(name))?;
        Ok(coll.matching(filter).count() as u64)
    }

    async fn upsert(
        &self,
        name: &str,
        documents: Vec<StoredDocument>,
    ) -> Result<(), VectorDbError> {
        let mut collections = self.collections.write();
        let coll = collections.get_mut(name).ok_or_else(|| not_found(name))?;

        // Validate the whole batch first so a bad vector leaves nothing half-written.
        if let Some(bad) = documents.iter().find(|d| d.vector.len() != coll.dimension) {
            return Err(VectorDbError::InvalidDimension {
                expected: coll.dimension,
                actual: bad.vector.len(),
            });
        }

        for doc in documents {
            coll.documents.insert(
                doc.id,
                MemoryDocument {
                    text: doc.text,
                    metadata: doc.metadata,
                    vector: doc.vector,
                },
            );
        }

        Ok(())
    }

    async fn delete_documents(&self, name: &str, ids: &[String]) -> Result<(), VectorDbError> {
        let mut collections = self.collections.write();
        let coll = collections.get_mut(name).ok_or_else(|| not_found(name))?;

        for id in ids {
            coll.documents.remove(id);
        }

        Ok(())
    }

    async fn clear(&self, name: &str) -> Result<u64, VectorDbError> {
        let mut collections = self.collections.write();
        let coll = collections.get_mut(name).ok_or_else(|| not_found(name))?;

        let deleted = coll.documents.len() as u64;
        coll.documents.clear();
        Ok(deleted)
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        let collections = self.collections.read();
        let coll = collections.get(name).ok_or_else(|| not_found(name))?;

        if vector.len() != coll.dimension {
            return Err(VectorDbError::InvalidDimension {
                expected: coll.dimension,
                actual: vector.len(),
            });
        }

        let mut hits: Vec<SearchHit> = coll
            .matching(filter)
            .map(|(id, doc)| SearchHit {
                id: id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                distance: 1.0 - cosine_similarity(&vector, &doc.vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit as usize);

        Ok(hits)
    }

    async fn fetch(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<DocumentRecord>, VectorDbError> {
        let collections = self.collections.read();
        let coll = collections.get(name).ok_or_else(|| not_found(name))?;

        Ok(coll
            .matching(filter)
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(id, doc)| DocumentRecord {
                id: id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
            })
            .collect())
    }

    async fn scan(
        &self,
        name: &str,
        cursor: Option<ScanCursor>,
        limit: u64,
    ) -> Result<ScanPage, VectorDbError> {
        let collections = self.collections.read();
        let coll = collections.get(name).ok_or_else(|| not_found(name))?;

        let start = match cursor {
            None => Bound::Unbounded,
            Some(ScanCursor::After(id)) => Bound::Excluded(id),
            Some(ScanCursor::Point(_)) => {
                return Err(VectorDbError::ReadFailed {
                    collection: name.to_string(),
                    message: "cursor does not belong to this engine".to_string(),
                });
            }
        };

        let mut range = coll.documents.range((start, Bound::Unbounded));
        let documents: Vec<DocumentRecord> = range
            .by_ref()
            .take(limit as usize)
            .map(|(id, doc)| DocumentRecord {
                id: id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
            })
            .collect();

        let next = match (range.next(), documents.last()) {
            (Some(_), Some(last)) => Some(ScanCursor::After(last.id.clone())),
            _ => None,
        };

        Ok(ScanPage { documents, next })
    }

    async fn health_check(&self) -> Result<(), VectorDbError> {
        Ok(())
    }
}
