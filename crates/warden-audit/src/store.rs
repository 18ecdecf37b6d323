//! Storage contracts consumed by the audit pipeline.
//!
//! The host framework owns persistence. The pipeline needs two capabilities
//! from it: querying version history ([`VersionStore`]) and creating a record
//! through the trusted, access-bypassing path ([`DocumentWriter`]).
//! [`MemoryStore`] implements both in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Errors reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The resource keeps no version history.
    #[error("versions are not enabled for '{0}'")]
    NotVersioned(String),

    /// The backend refused the write.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached or is in a failed state.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Sort order for version queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionSort {
    /// Most recently updated first.
    #[default]
    UpdatedAtDesc,
    UpdatedAtAsc,
}

/// Query against a resource's version history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionQuery {
    pub resource: String,
    /// Parent document for collections; `None` for globals.
    pub parent: Option<String>,
    pub limit: usize,
    pub sort: VersionSort,
    /// Skip the version that mirrors the document's current state.
    pub exclude_current: bool,
}

impl VersionQuery {
    /// The single most recent non-current version of a subject.
    pub fn previous(resource: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            resource: resource.into(),
            parent,
            limit: 1,
            sort: VersionSort::UpdatedAtDesc,
            exclude_current: true,
        }
    }
}

/// One stored snapshot of a document or global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Whether this version mirrors the current state.
    pub latest: bool,
    #[serde(default)]
    pub snapshot: Value,
}

/// A page of version query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionPage {
    pub docs: Vec<VersionEntry>,
    /// Total matches before the limit was applied.
    pub total_docs: usize,
}

/// Version-history query capability.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn find_versions(&self, query: VersionQuery) -> Result<VersionPage, StoreError>;
}

/// Trusted record creation capability.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Persist one record in `collection` and return its assigned id.
    async fn create(&self, collection: &str, data: Map<String, Value>)
    -> Result<String, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredVersion {
    entry: VersionEntry,
    // Tie-breaker for versions written within the same clock tick.
    seq: u64,
}

/// In-memory documents and version history.
///
/// Failure switches let callers simulate an unavailable backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Vec<Value>>>,
    versions: RwLock<HashMap<String, Vec<StoredVersion>>>,
    seq: AtomicU64,
    fail_versions: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every version query fail.
    pub fn fail_version_queries(&self, fail: bool) {
        self.fail_versions.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a document, assigning an id unless it already has one.
    pub fn insert(
        &self,
        collection: &str,
        mut data: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let existing = data.get("id").and_then(|id| match id {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                data.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut documents = self.documents.write().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        documents
            .entry(collection.to_string())
            .or_default()
            .push(Value::Object(data));
        Ok(id)
    }

    /// Replace a document by id, returning the stored value.
    pub fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut documents = self.documents.write().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        let Some(doc) = documents
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| doc_id(d).as_deref() == Some(id)))
        else {
            return Ok(None);
        };
        *doc = data;
        Ok(Some(doc.clone()))
    }

    /// Remove a document by id, returning it.
    pub fn remove(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let mut documents = self.documents.write().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        let Some(docs) = documents.get_mut(collection) else {
            return Ok(None);
        };
        let position = docs.iter().position(|d| doc_id(d).as_deref() == Some(id));
        Ok(position.map(|idx| docs.remove(idx)))
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let documents = self.documents.read().ok()?;
        documents
            .get(collection)?
            .iter()
            .find(|d| doc_id(d).as_deref() == Some(id))
            .cloned()
    }

    /// All documents of a collection in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.documents
            .read()
            .map(|docs| docs.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.documents(collection).len()
    }

    /// Record a new version of a subject; it becomes the latest one.
    pub fn save_version(
        &self,
        resource: &str,
        parent: Option<&str>,
        snapshot: Value,
    ) -> Result<String, StoreError> {
        let mut versions = self.versions.write().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        let history = versions.entry(resource.to_string()).or_default();

        for stored in history
            .iter_mut()
            .filter(|v| v.entry.parent.as_deref() == parent)
        {
            stored.entry.latest = false;
        }

        let id = Uuid::new_v4().to_string();
        history.push(StoredVersion {
            entry: VersionEntry {
                id: id.clone(),
                parent: parent.map(str::to_string),
                updated_at: Utc::now(),
                latest: true,
                snapshot,
            },
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
        });
        Ok(id)
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn find_versions(&self, query: VersionQuery) -> Result<VersionPage, StoreError> {
        if self.fail_versions.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("version history offline".to_string()));
        }

        let versions = self.versions.read().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut matches: Vec<&StoredVersion> = versions
            .get(&query.resource)
            .map(|history| {
                history
                    .iter()
                    .filter(|v| v.entry.parent == query.parent)
                    .filter(|v| !(query.exclude_current && v.entry.latest))
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by_key(|v| (v.entry.updated_at, v.seq));
        if query.sort == VersionSort::UpdatedAtDesc {
            matches.reverse();
        }

        let total_docs = matches.len();
        let docs = matches
            .into_iter()
            .take(query.limit)
            .map(|v| v.entry.clone())
            .collect();

        Ok(VersionPage { docs, total_docs })
    }
}

#[async_trait]
impl DocumentWriter for MemoryStore {
    async fn create(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<String, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("document store offline".to_string()));
        }
        self.insert(collection, data)
    }
}

/// Read a document's id as a string. Numeric ids are stringified.
pub fn doc_id(doc: &Value) -> Option<String> {
    match doc.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
