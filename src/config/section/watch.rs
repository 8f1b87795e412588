//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! roots = ["src", "resources"]   # Directories to poll
//! interval_ms = 3000             # Delay between passes
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Default delay between two poll passes.
pub const DEFAULT_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directories to watch. Relative paths resolve against the config file.
    pub roots: Vec<PathBuf>,

    /// Poll interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from("src")],
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.roots.is_empty() {
            diag.error_with_hint(
                FieldPath::new("watch.roots"),
                "at least one directory must be watched",
                "roots = [\"src\"]",
            );
        }
        if self.interval_ms == 0 {
            diag.error_with_hint(
                FieldPath::new("watch.interval_ms"),
                "poll interval must be positive",
                format!("the default is {DEFAULT_INTERVAL_MS}"),
            );
        }
    }
}
