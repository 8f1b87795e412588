//! `[store]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [store]
//! kind = "file"            # "file" or "memory"
//! output = "target/reload" # Directory for the file store
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Output directory for `kind = "file"`.
    pub output: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::File,
            output: PathBuf::from("target/reload"),
        }
    }
}
