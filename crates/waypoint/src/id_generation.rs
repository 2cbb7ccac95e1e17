//! Hash-based ID generation for items and dependency edges.
//!
//! IDs are `{prefix}-{hash}` where the hash is a base36 rendering of a SHA256
//! digest over the record's content, a timestamp, and a retry nonce.
//! The hash grows from 4 to 6 characters as the store fills up.
//!
//! # Example
//!
//! ```
//! use waypoint::id_generation::{IdGenerator, IdGeneratorConfig};
//!
//! let mut generator = IdGenerator::new(IdGeneratorConfig {
//!     prefix: "road".to_string(),
//!     database_size: 10,
//! });
//!
//! let id = generator.generate(&["Launch beta", "Public beta for search"]).unwrap();
//! assert!(id.starts_with("road-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_HASH_LENGTH: usize = 6;

/// Prefix used for dependency edge IDs.
pub const EDGE_ID_PREFIX: &str = "dep";

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce at every permitted length produced a taken ID
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried at the final length
        attempts: u32,
    },

    /// Requested hash length was zero
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all IDs (e.g., "road")
    pub prefix: String,

    /// Number of records already stored (drives the adaptive length)
    pub database_size: usize,
}

/// Hash-based ID generator with collision detection.
///
/// Keeps the set of IDs it has handed out or been told about, so a long
/// lived generator grows with the store. Stores recreate it only when the
/// adaptive length changes.
#[derive(Debug)]
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.existing_ids.insert(id.into());
    }

    /// Forget a previously registered ID.
    pub fn release_id(&mut self, id: &str) {
        self.existing_ids.remove(id);
    }

    /// Number of IDs currently reserved.
    #[cfg(test)]
    pub(crate) fn registered_count(&self) -> usize {
        self.existing_ids.len()
    }

    /// Store size this generator was configured for.
    pub fn database_size(&self) -> usize {
        self.config.database_size
    }

    /// Generate a new unique ID from the given content parts.
    ///
    /// # Errors
    ///
    /// Returns an error if every nonce collides even at the maximum length.
    pub fn generate(&mut self, parts: &[&str]) -> Result<String, IdGenerationError> {
        let base_length = self.adaptive_length();

        for length in base_length..=MAX_HASH_LENGTH {
            if length > base_length {
                warn!(
                    length,
                    max_nonce = MAX_NONCE,
                    "All nonces exhausted, increasing ID length"
                );
            }
            for nonce in 0..MAX_NONCE {
                let id = self.hash_id(parts, nonce, length)?;
                if self.existing_ids.insert(id.clone()) {
                    if nonce > 0 {
                        debug!(nonce, length, "Generated unique ID after collision retries");
                    }
                    return Ok(id);
                }
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    fn hash_id(&self, parts: &[&str], nonce: u32, length: usize) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(b"|");
        }
        hasher.update(timestamp.to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();

        let hash = encode_base36(&digest[..8], length)?;
        Ok(format!("{}-{}", self.config.prefix, hash))
    }

    /// - 0-500 records: 4 chars
    /// - 501-1,500: 5 chars
    /// - 1,500+: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.config.database_size {
            0..=500 => 4,
            501..=1500 => 5,
            _ => MAX_HASH_LENGTH,
        }
    }
}

/// Encode up to 8 bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut n = bytes
        .iter()
        .fold(0u64, |acc, &byte| acc.wrapping_shl(8).wrapping_add(u64::from(byte)));

    let mut encoded = Vec::with_capacity(length);
    while encoded.len() < length {
        encoded.push(char::from(BASE36_CHARS[(n % 36) as usize]));
        n /= 36;
    }
    encoded.reverse();

    Ok(encoded.into_iter().collect())
}

/// Check that `id` has the form `{prefix}-{hash}` with a 4-6 char base36 hash.
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(hash) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    (4..=MAX_HASH_LENGTH).contains(&hash.len())
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}
