//! In-memory store backed by `HashMap`s and a petgraph adjacency index.
//!
//! Data is held in RAM and lost when the process exits unless persisted with
//! [`save_to_jsonl`]; [`load_from_jsonl`] rebuilds a store from disk.
//!
//! # Edge Direction Convention
//!
//! Edges point from the **dependent** (source) to the **dependency**
//! (target). If "Public beta" cannot ship before "Search backend", the edge is
//! `public-beta -> search-backend`.
//!
//! # Thread Safety
//!
//! [`InMemoryStore`] is a cheap, cloneable handle. All clones share:
//!
//! - one data mutex, taken by every operation for its whole duration, which
//!   makes each operation (including cascade deletes) atomic;
//! - one advisory edge lock, handed out by `lock_edges()`, which graph
//!   writers hold across multi-call read-check-write sequences.
//!
//! # Performance Characteristics
//!
//! - Item create/get/update: O(1) amortized
//! - Edge insert/delete: O(1)
//! - Edges of an item: O(d log d) where d is the item's degree (sorted by id)
//! - Cascade delete: O(d)

mod inner;
mod jsonl;
mod trait_impl;

use inner::InMemoryStoreInner;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub use jsonl::{load_from_jsonl, save_to_jsonl, LoadWarning};

/// Thread-safe in-memory item store.
#[derive(Clone)]
pub struct InMemoryStore {
    data: Arc<Mutex<InMemoryStoreInner>>,
    edge_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

impl InMemoryStore {
    /// Create a new, empty in-memory store.
    ///
    /// # Arguments
    ///
    /// * `prefix` - The prefix for item IDs (e.g., "road")
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint::store::InMemoryStore;
    ///
    /// let store = InMemoryStore::new("road".to_string());
    /// let shared = store.clone(); // same data, same edge lock
    /// # drop(shared);
    /// ```
    pub fn new(prefix: String) -> Self {
        Self {
            data: Arc::new(Mutex::new(InMemoryStoreInner::new(prefix))),
            edge_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn lock(&self) -> MutexGuard<'_, InMemoryStoreInner> {
        self.data.lock().await
    }
}
