//! Implementation of the `init` command.
//!
//! Creates the `.waypoint/` directory with configuration, an empty roadmap
//! file and a `.gitignore`.

use crate::config::{validate_prefix, WaypointConfig, CONFIG_FILE_NAME, DATA_FILE_NAME, DEFAULT_PREFIX, WAYPOINT_DIR_NAME};
use crate::error::{ConfigError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .waypoint
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

const GITIGNORE_CONTENT: &str = "\
# Temporary files left behind by an interrupted save
*.tmp
# roadmap.jsonl is meant to be committed
";

/// Result of the init command
#[derive(Debug, Serialize)]
pub struct InitResult {
    /// Path to the created waypoint directory
    pub waypoint_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created roadmap file
    pub data_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
    /// The prefix used for item IDs
    pub prefix: String,
}

/// Initialize a new waypoint repository in `base_dir`.
///
/// `prefix` is trimmed and defaults to [`DEFAULT_PREFIX`].
///
/// # Errors
///
/// - `ConfigError::InvalidPrefix` if the prefix is malformed
/// - `ConfigError::AlreadyInitialized` if `.waypoint/` already exists
/// - `Error::Io` if any file can't be written
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let waypoint_dir = base_dir.join(WAYPOINT_DIR_NAME);
    if waypoint_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(WAYPOINT_DIR_NAME.to_string()).into());
    }

    fs::create_dir_all(&waypoint_dir).await?;

    let config_file = waypoint_dir.join(CONFIG_FILE_NAME);
    WaypointConfig::new(prefix).save(&config_file).await?;

    let data_file = waypoint_dir.join(DATA_FILE_NAME);
    fs::write(&data_file, "").await?;

    let gitignore_file = waypoint_dir.join(GITIGNORE_FILE_NAME);
    fs::write(&gitignore_file, GITIGNORE_CONTENT).await?;

    tracing::info!(path = %waypoint_dir.display(), prefix, "Initialized waypoint repository");

    Ok(InitResult {
        waypoint_dir,
        config_file,
        data_file,
        gitignore_file,
        prefix: prefix.to_string(),
    })
}
