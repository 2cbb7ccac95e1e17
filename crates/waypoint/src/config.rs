//! Repository configuration.
//!
//! A waypoint repository is a directory containing `.waypoint/config.yaml`:
//!
//! ```yaml
//! item-prefix: road
//! storage:
//!   backend: jsonl
//!   data_file: .waypoint/roadmap.jsonl
//! ```

use crate::error::{ConfigError, Result};
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default item prefix if none specified
pub const DEFAULT_PREFIX: &str = "road";

/// Name of the waypoint directory
pub const WAYPOINT_DIR_NAME: &str = ".waypoint";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the roadmap data file
pub const DATA_FILE_NAME: &str = "roadmap.jsonl";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to traverse when searching for the waypoint root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaypointConfig {
    /// Item ID prefix (e.g., "road" for "road-a3f8")
    #[serde(rename = "item-prefix")]
    pub item_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// `"jsonl"` (persisted) or `"memory"` (discarded on exit)
    pub backend: String,

    /// Data file path, relative to the repository root
    pub data_file: String,
}

impl StorageConfig {
    /// Resolve the configured backend against the repository root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownBackend` for anything but `jsonl` or `memory`.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StoreBackend> {
        match self.backend.as_str() {
            "jsonl" => Ok(StoreBackend::Jsonl(root_dir.join(&self.data_file))),
            "memory" => Ok(StoreBackend::InMemory),
            other => Err(ConfigError::UnknownBackend(other.to_string()).into()),
        }
    }
}

impl WaypointConfig {
    /// Create a new configuration with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            item_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: "jsonl".to_string(),
                data_file: format!("{WAYPOINT_DIR_NAME}/{DATA_FILE_NAME}"),
            },
        }
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        validate_prefix(&config.item_prefix)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Validate item ID prefix format.
///
/// Requirements:
/// - 2-20 characters
/// - ASCII letters and digits only
///
/// Expects pre-trimmed input.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(ConfigError::InvalidPrefix(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::InvalidPrefix(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidPrefix(
            "Prefix must contain only alphanumeric characters".to_string(),
        )
        .into());
    }

    Ok(())
}

/// Find the waypoint root directory by searching up the directory tree.
///
/// Returns the directory containing `.waypoint/`, or `None` if none is found
/// before the filesystem root or [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_waypoint_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(WAYPOINT_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
