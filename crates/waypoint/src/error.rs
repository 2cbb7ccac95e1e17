//! Error types for waypoint operations.
//!
//! Every graph rejection is a distinct, recoverable variant so callers can
//! tell a malformed reference from a duplicate or a cycle without parsing
//! messages.

use crate::domain::{EdgeId, ItemId};
use std::io;
use thiserror::Error;

/// The error type for waypoint operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An item id was empty or does not resolve in the item store.
    #[error("Invalid item reference: {0}")]
    InvalidReference(String),

    /// An edge with the same ordered `(source, target)` pair already exists.
    #[error("Dependency already exists: {source_id} -> {target_id}")]
    DuplicateEdge {
        /// Dependent item
        source_id: ItemId,
        /// Item depended upon
        target_id: ItemId,
    },

    /// Adding `source -> target` would close a cycle.
    #[error("Adding dependency {source_id} -> {target_id} would create a cycle")]
    CycleDetected {
        /// Dependent item
        source_id: ItemId,
        /// Item depended upon
        target_id: ItemId,
    },

    /// No edge exists with the given id.
    #[error("Dependency not found: {0}")]
    EdgeNotFound(EdgeId),

    /// No item exists with the given id.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Item data failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The stored graph contains a cycle, so no planning order exists.
    #[error("Dependency graph contains a cycle through {0}")]
    Cycle(ItemId),
}

/// Errors raised while locating or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.waypoint/` directory was found above the working directory.
    #[error("Not a waypoint repository (or any parent directory). Run 'waypoint init' first.")]
    NotInitialized,

    /// A repository already exists at the target location.
    #[error("Waypoint is already initialized in this directory. Found existing '{0}'")]
    AlreadyInitialized(String),

    /// The item prefix is malformed.
    #[error("{0}")]
    InvalidPrefix(String),

    /// The storage backend named in the config is unknown.
    #[error("Unknown storage backend: '{0}'. Expected 'memory' or 'jsonl'")]
    UnknownBackend(String),

    /// The YAML file could not be parsed or written.
    #[error("Configuration error: {0}")]
    Yaml(String),
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// ID generation failed.
    #[error("ID generation failed: {0}")]
    IdGeneration(#[from] crate::id_generation::IdGenerationError),

    /// A record could not be serialized for persistence.
    #[error("Serialization failed: {0}")]
    Serialization(serde_json::Error),

    /// The backing file is not in the expected format.
    #[error("Invalid storage format: {0}")]
    InvalidFormat(String),

    /// The requested backend is not available.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// A specialized Result type for waypoint operations.
pub type Result<T> = std::result::Result<T, Error>;
