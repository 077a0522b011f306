//! Execution Configuration
//!
//! Hierarchical configuration loading from:
//! - `rowflow.toml` (optional, in the working directory)
//! - Environment variables (`ROWFLOW_*` prefix, `__` as section separator)
//!
//! ## Example
//!
//! ```toml
//! # rowflow.toml
//! [sort]
//! chunk_size = 50000
//! spill_dir = "/var/tmp/rowflow"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ROWFLOW_SORT__CHUNK_SIZE=100000
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Execution configuration for graph runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External sort settings
    #[serde(default)]
    pub sort: SortConfig,
}

/// External merge sort configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Maximum rows held in memory per sorted run
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Directory for spill files (system temp directory when unset)
    #[serde(default)]
    pub spill_dir: Option<PathBuf>,
}

fn default_chunk_size() -> usize {
    50_000
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            chunk_size: default_chunk_size(),
            spill_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `rowflow.toml` and `ROWFLOW_*` environment
    /// variables, falling back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        let config = Figment::new()
            .merge(Toml::file("rowflow.toml"))
            .merge(Env::prefixed("ROWFLOW_").split("__"))
            .extract()?;
        Ok(config)
    }
}
