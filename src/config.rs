//! # Mesher Configuration
//!
//! Runtime knobs for the batch scheduler. Values can be built in code or loaded from a
//! JSON document, for example:
//!
//! ```json
//! { "batch_size": 8, "worker_threads": 4, "max_batch_retries": 2 }
//! ```
//!
//! Missing fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VoxelError, VoxelResult};

/// Default number of chunks processed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Default number of times a chunk from a failed batch is re-enqueued.
pub const DEFAULT_MAX_BATCH_RETRIES: u32 = 3;

/// Configuration for [`crate::MeshManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherConfig {
    /// Maximum number of chunks taken from the update queue per batch. Must be at least 1.
    pub batch_size: usize,
    /// Size of the worker pool. `None` uses the available hardware parallelism.
    pub worker_threads: Option<usize>,
    /// How many times a chunk from a failed batch is re-enqueued before it is dropped.
    pub max_batch_retries: u32,
    /// Flag forwarded to the collider bake collaborator.
    pub convex_colliders: bool,
}

impl Default for MesherConfig {
    fn default() -> Self {
        MesherConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            worker_threads: None,
            max_batch_retries: DEFAULT_MAX_BATCH_RETRIES,
            convex_colliders: false,
        }
    }
}

impl MesherConfig {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> VoxelResult<Self> {
        let config: MesherConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> VoxelResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks the invariants the scheduler relies on.
    pub fn validate(&self) -> VoxelResult<()> {
        if self.batch_size == 0 {
            return Err(VoxelError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(VoxelError::InvalidConfig(
                "worker_threads must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// The worker pool size to use, resolving `None` to the hardware thread count.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|threads| threads.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MesherConfig::default();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.worker_threads, None);
        assert_eq!(config.max_batch_retries, 3);
        assert!(!config.convex_colliders);
        assert!(config.resolved_worker_threads() >= 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = MesherConfig::from_json_str(r#"{ "batch_size": 8 }"#).unwrap();
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.max_batch_retries, DEFAULT_MAX_BATCH_RETRIES);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = MesherConfig::from_json_str(r#"{ "batch_size": 0 }"#).unwrap_err();
        assert!(matches!(err, VoxelError::InvalidConfig(_)));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = MesherConfig {
            worker_threads: Some(0),
            ..MesherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        let err = MesherConfig::from_json_str("batch_size = 3").unwrap_err();
        assert!(matches!(err, VoxelError::ConfigParse(_)));
    }
}
