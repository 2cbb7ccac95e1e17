//! Item store abstraction for waypoint.
//!
//! The store is the durable home of roadmap items and their dependency
//! edges. The dependency graph manager never caches the graph: it asks the
//! store for outgoing and incoming edges one node at a time.
//!
//! - **In-memory**: `HashMap` for items and edges, `petgraph` adjacency index
//! - **JSONL**: the in-memory store plus atomic file persistence
//!
//! # Serializing graph writes
//!
//! [`ItemStore::lock_edges`] returns an owned advisory guard shared by every
//! handle onto the same store. Writers that read the graph before mutating it
//! (the cycle check in particular) must hold the guard across the whole
//! read-check-write sequence. Plain reads never take it.
//!
//! # Example
//!
//! ```no_run
//! use waypoint::store::{create_store, StoreBackend};
//! use waypoint::domain::NewItem;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = create_store(StoreBackend::InMemory, "road".to_string()).await?;
//!     let item = store.create_item(NewItem::titled("Public beta")).await?;
//!     println!("Created item: {}", item.id);
//!     Ok(())
//! }
//! ```

use crate::domain::{
    DependencyEdge, EdgeId, EdgeType, Item, ItemFilter, ItemId, ItemUpdate, NewDependency,
    NewItem, Snapshot,
};
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod in_memory;

pub use in_memory::{load_from_jsonl, save_to_jsonl, InMemoryStore, LoadWarning};

/// Advisory guard serializing graph mutations on one store.
pub type EdgeWriteGuard = tokio::sync::OwnedMutexGuard<()>;

/// Core storage trait for roadmap items and dependency edges.
///
/// # Method Categories
///
/// - **Edges**: `edges_with_source`, `edges_with_target`, `get_edge`, `all_edges`,
///   `insert_edge`, `update_edge_type`, `delete_edge`, `delete_edges_for_item`
/// - **Write serialization**: `lock_edges`
/// - **Items**: `create_item`, `get_item`, `update_item`, `delete_item`, `list_items`
/// - **Batch**: `import`, `export_all`
/// - **Persistence**: `save`, `reload`
///
/// Edge listings are ordered by edge id so repeated reads of an unchanged
/// store return identical sequences.
#[async_trait]
pub trait ItemStore: Send + Sync {
    // ========== Edges ==========

    /// All edges whose source is `id` (what `id` depends on).
    async fn edges_with_source(&self, id: &ItemId) -> Result<Vec<DependencyEdge>>;

    /// All edges whose target is `id` (what depends on `id`).
    async fn edges_with_target(&self, id: &ItemId) -> Result<Vec<DependencyEdge>>;

    /// Look up one edge.
    async fn get_edge(&self, id: &EdgeId) -> Result<Option<DependencyEdge>>;

    /// Every edge in the store.
    async fn all_edges(&self) -> Result<Vec<DependencyEdge>>;

    /// Persist a new edge and assign its id.
    ///
    /// Only referential integrity is checked here. Duplicate and cycle
    /// checks belong to the caller, under [`ItemStore::lock_edges`].
    ///
    /// # Errors
    ///
    /// - `Error::InvalidReference` if either endpoint is not a stored item
    /// - `Error::DuplicateEdge` if the ordered pair is already stored
    async fn insert_edge(&mut self, edge: NewDependency) -> Result<DependencyEdge>;

    /// Change an edge's descriptive type.
    ///
    /// # Errors
    ///
    /// - `Error::EdgeNotFound` if the edge doesn't exist
    async fn update_edge_type(&mut self, id: &EdgeId, edge_type: EdgeType)
        -> Result<DependencyEdge>;

    /// Remove one edge, returning it.
    ///
    /// # Errors
    ///
    /// - `Error::EdgeNotFound` if the edge doesn't exist
    async fn delete_edge(&mut self, id: &EdgeId) -> Result<DependencyEdge>;

    /// Remove every edge where `id` is source or target, all or nothing.
    async fn delete_edges_for_item(&mut self, id: &ItemId) -> Result<Vec<DependencyEdge>>;

    // ========== Write serialization ==========

    /// Acquire the store-wide advisory lock for graph mutations.
    async fn lock_edges(&self) -> EdgeWriteGuard;

    // ========== Items ==========

    /// Create a new item with a generated id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the title, description or priority is invalid.
    async fn create_item(&mut self, item: NewItem) -> Result<Item>;

    /// Get an item by id, `None` if absent.
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>>;

    /// Apply a partial update and return the updated item.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if the item doesn't exist
    /// - `Error::Validation` if the result is invalid (nothing is changed)
    async fn update_item(&mut self, id: &ItemId, updates: ItemUpdate) -> Result<Item>;

    /// Delete an item and cascade-delete its edges in one step.
    ///
    /// Returns the removed edges.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if the item doesn't exist
    async fn delete_item(&mut self, id: &ItemId) -> Result<Vec<DependencyEdge>>;

    /// Items matching the filter, by priority, then age, then id.
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    // ========== Batch ==========

    /// Load items and edges verbatim, bypassing cycle checks.
    ///
    /// Edges with unknown endpoints or repeated pairs are skipped and
    /// reported; cycles are kept so they can be diagnosed.
    async fn import(&mut self, snapshot: Snapshot) -> Result<Vec<ImportWarning>>;

    /// Copy of everything in the store.
    async fn export_all(&self) -> Result<Snapshot>;

    // ========== Persistence ==========

    /// Flush changes to persistent storage (no-op for in-memory).
    async fn save(&self) -> Result<()>;

    /// Discard unsaved changes and re-read persistent state (no-op for in-memory).
    async fn reload(&mut self) -> Result<()>;
}

/// Non-fatal problems found while importing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    /// An item id appeared twice; the later record was skipped
    DuplicateItem {
        /// The repeated id
        id: ItemId,
    },

    /// An edge points at an item that isn't in the snapshot
    OrphanedEdge {
        /// Skipped edge
        edge_id: EdgeId,
        /// Dependent item
        source: ItemId,
        /// Item depended upon
        target: ItemId,
    },

    /// An edge repeats an existing `(source, target)` pair or edge id
    DuplicateEdge {
        /// Skipped edge
        edge_id: EdgeId,
        /// Dependent item
        source: ItemId,
        /// Item depended upon
        target: ItemId,
    },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateItem { id } => write!(f, "skipped duplicate item {id}"),
            Self::OrphanedEdge {
                edge_id,
                source,
                target,
            } => write!(f, "skipped orphaned dependency {edge_id}: {source} -> {target}"),
            Self::DuplicateEdge {
                edge_id,
                source,
                target,
            } => write!(f, "skipped duplicate dependency {edge_id}: {source} -> {target}"),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StoreBackend {
    /// Returns the data file path for file-based backends.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StoreBackend::Jsonl(path) => Some(path),
            StoreBackend::InMemory => None,
        }
    }
}

/// Wrapper that adds JSONL file persistence to the in-memory store.
struct JsonlBackedStore {
    inner: InMemoryStore,
    path: PathBuf,
    prefix: String,
}

impl JsonlBackedStore {
    async fn open(path: PathBuf, prefix: String) -> Result<Self> {
        let inner = load_or_empty(&path, &prefix).await?;
        Ok(Self {
            inner,
            path,
            prefix,
        })
    }
}

async fn load_or_empty(path: &Path, prefix: &str) -> Result<InMemoryStore> {
    if !path.exists() {
        // First run: nothing on disk yet.
        return Ok(InMemoryStore::new(prefix.to_string()));
    }
    let (store, warnings) = load_from_jsonl(path, prefix.to_string()).await?;
    for warning in &warnings {
        tracing::warn!(%warning, path = %path.display(), "JSONL load warning");
    }
    Ok(store)
}

#[async_trait]
impl ItemStore for JsonlBackedStore {
    async fn edges_with_source(&self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        self.inner.edges_with_source(id).await
    }

    async fn edges_with_target(&self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        self.inner.edges_with_target(id).await
    }

    async fn get_edge(&self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        self.inner.get_edge(id).await
    }

    async fn all_edges(&self) -> Result<Vec<DependencyEdge>> {
        self.inner.all_edges().await
    }

    async fn insert_edge(&mut self, edge: NewDependency) -> Result<DependencyEdge> {
        self.inner.insert_edge(edge).await
    }

    async fn update_edge_type(
        &mut self,
        id: &EdgeId,
        edge_type: EdgeType,
    ) -> Result<DependencyEdge> {
        self.inner.update_edge_type(id, edge_type).await
    }

    async fn delete_edge(&mut self, id: &EdgeId) -> Result<DependencyEdge> {
        self.inner.delete_edge(id).await
    }

    async fn delete_edges_for_item(&mut self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        self.inner.delete_edges_for_item(id).await
    }

    async fn lock_edges(&self) -> EdgeWriteGuard {
        self.inner.lock_edges().await
    }

    async fn create_item(&mut self, item: NewItem) -> Result<Item> {
        self.inner.create_item(item).await
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        self.inner.get_item(id).await
    }

    async fn update_item(&mut self, id: &ItemId, updates: ItemUpdate) -> Result<Item> {
        self.inner.update_item(id, updates).await
    }

    async fn delete_item(&mut self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        self.inner.delete_item(id).await
    }

    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        self.inner.list_items(filter).await
    }

    async fn import(&mut self, snapshot: Snapshot) -> Result<Vec<ImportWarning>> {
        self.inner.import(snapshot).await
    }

    async fn export_all(&self) -> Result<Snapshot> {
        self.inner.export_all().await
    }

    async fn save(&self) -> Result<()> {
        save_to_jsonl(&self.inner, &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = load_or_empty(&self.path, &self.prefix).await?;
        Ok(())
    }
}

/// Create a store for the given backend.
///
/// # Arguments
///
/// * `backend` - The storage backend to use
/// * `prefix` - The prefix for generated item IDs (e.g., "road")
///
/// # Errors
///
/// - `Error::Io` / `Error::Storage` if the JSONL file exists but can't be read
pub async fn create_store(backend: StoreBackend, prefix: String) -> Result<Box<dyn ItemStore>> {
    match backend {
        StoreBackend::InMemory => Ok(Box::new(InMemoryStore::new(prefix))),
        StoreBackend::Jsonl(path) => Ok(Box::new(JsonlBackedStore::open(path, prefix).await?)),
    }
}

// ========== Test Utilities ==========

/// The single item id known to [`MockStore`].
#[cfg(any(test, feature = "test-util"))]
pub const MOCK_ITEM_ID: &str = "mock-0001";

/// Stateless [`ItemStore`] for exercising code against a trait object.
///
/// Knows exactly one item ([`MOCK_ITEM_ID`]) and no edges. Every mutation
/// fails with `StorageError::Unavailable`, which makes it handy for checking
/// that callers fail closed.
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Default)]
pub struct MockStore {
    lock: std::sync::Arc<tokio::sync::Mutex<()>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MockStore {
    /// Create a new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The item returned for [`MOCK_ITEM_ID`].
    pub fn mock_item() -> Item {
        let now = chrono::Utc::now();
        Item {
            id: ItemId::new(MOCK_ITEM_ID),
            title: "Mock item".to_string(),
            description: String::new(),
            status: crate::domain::ItemStatus::Planned,
            priority: 2,
            branch: None,
            milestone: None,
            owner: None,
            effort_days: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn unavailable<T>(operation: &str) -> Result<T> {
        Err(crate::error::StorageError::Unavailable(format!("MockStore does not support {operation}")).into())
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl ItemStore for MockStore {
    async fn edges_with_source(&self, _id: &ItemId) -> Result<Vec<DependencyEdge>> {
        Ok(vec![])
    }

    async fn edges_with_target(&self, _id: &ItemId) -> Result<Vec<DependencyEdge>> {
        Ok(vec![])
    }

    async fn get_edge(&self, _id: &EdgeId) -> Result<Option<DependencyEdge>> {
        Ok(None)
    }

    async fn all_edges(&self) -> Result<Vec<DependencyEdge>> {
        Ok(vec![])
    }

    async fn insert_edge(&mut self, _edge: NewDependency) -> Result<DependencyEdge> {
        Self::unavailable("insert_edge")
    }

    async fn update_edge_type(
        &mut self,
        _id: &EdgeId,
        _edge_type: EdgeType,
    ) -> Result<DependencyEdge> {
        Self::unavailable("update_edge_type")
    }

    async fn delete_edge(&mut self, _id: &EdgeId) -> Result<DependencyEdge> {
        Self::unavailable("delete_edge")
    }

    async fn delete_edges_for_item(&mut self, _id: &ItemId) -> Result<Vec<DependencyEdge>> {
        Self::unavailable("delete_edges_for_item")
    }

    async fn lock_edges(&self) -> EdgeWriteGuard {
        self.lock.clone().lock_owned().await
    }

    async fn create_item(&mut self, _item: NewItem) -> Result<Item> {
        Self::unavailable("create_item")
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        Ok((id.as_str() == MOCK_ITEM_ID).then(Self::mock_item))
    }

    async fn update_item(&mut self, _id: &ItemId, _updates: ItemUpdate) -> Result<Item> {
        Self::unavailable("update_item")
    }

    async fn delete_item(&mut self, _id: &ItemId) -> Result<Vec<DependencyEdge>> {
        Self::unavailable("delete_item")
    }

    async fn list_items(&self, _filter: &ItemFilter) -> Result<Vec<Item>> {
        Ok(vec![Self::mock_item()])
    }

    async fn import(&mut self, _snapshot: Snapshot) -> Result<Vec<ImportWarning>> {
        Self::unavailable("import")
    }

    async fn export_all(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            items: vec![Self::mock_item()],
            edges: vec![],
        })
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
