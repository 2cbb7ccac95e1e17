//! Application context for CLI command execution.
//!
//! # Example
//!
//! ```no_run
//! use waypoint::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let ready = app.graph().ready_items(&Default::default()).await?;
//!     println!("{} items ready", ready.len());
//!     Ok(())
//! }
//! ```

use crate::config::{find_waypoint_root, WaypointConfig, CONFIG_FILE_NAME, WAYPOINT_DIR_NAME};
use crate::error::{ConfigError, Result};
use crate::graph::DependencyManager;
use crate::store::{create_store, ItemStore};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
///
/// Locates the repository, loads its configuration and opens the store
/// behind a [`DependencyManager`].
pub struct App {
    graph: DependencyManager,

    /// Path to the waypoint directory (.waypoint)
    waypoint_dir: PathBuf,

    /// Item ID prefix from configuration
    prefix: String,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("waypoint_dir", &self.waypoint_dir)
            .field("prefix", &self.prefix)
            .field("store", &"<dyn ItemStore>")
            .finish()
    }
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.waypoint/`, loads configuration
    /// and opens the configured store.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NotInitialized` if no repository is found
    /// - configuration or storage errors while loading
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_waypoint_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let waypoint_dir = root_dir.join(WAYPOINT_DIR_NAME);
        let config = WaypointConfig::load(&waypoint_dir.join(CONFIG_FILE_NAME)).await?;

        let backend = config.storage.to_backend(&root_dir)?;
        tracing::debug!(?backend, prefix = %config.item_prefix, "Opening store");
        let store = create_store(backend, config.item_prefix.clone()).await?;

        Ok(Self {
            graph: DependencyManager::new(store),
            waypoint_dir,
            prefix: config.item_prefix,
        })
    }

    /// The dependency graph manager.
    pub fn graph(&self) -> &DependencyManager {
        &self.graph
    }

    /// Mutable access to the dependency graph manager.
    pub fn graph_mut(&mut self) -> &mut DependencyManager {
        &mut self.graph
    }

    /// The store, for item reads.
    pub fn store(&self) -> &dyn ItemStore {
        self.graph.store()
    }

    /// The store, for item writes.
    pub fn store_mut(&mut self) -> &mut dyn ItemStore {
        self.graph.store_mut()
    }

    /// Get the item ID prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the path to the waypoint directory.
    pub fn waypoint_dir(&self) -> &Path {
        &self.waypoint_dir
    }

    /// Persist the store after a mutating command.
    ///
    /// If writing fails, the in-memory state is rolled back to what is on
    /// disk so nothing half-applied survives, and the write error is returned.
    ///
    /// # Errors
    ///
    /// Returns the save error (a failed rollback is logged, not returned).
    pub async fn save(&mut self) -> Result<()> {
        let Err(err) = self.graph.store().save().await else {
            return Ok(());
        };

        tracing::warn!(error = %err, "Save failed; reloading from disk");
        if let Err(reload_err) = self.graph.store_mut().reload().await {
            tracing::error!(error = %reload_err, "Reload after failed save also failed");
        }
        Err(err)
    }
}
