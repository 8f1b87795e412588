//! Configuration management for `reload.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── watch      # [watch]
//! │   ├── compile    # [compile]
//! │   └── store      # [store]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # ReloadConfig (this file)
//! ```
//!
//! Every section is optional; a missing file section means its defaults.

pub mod section;
pub mod types;

pub use section::{CompileConfig, StoreConfig, StoreKind, WatchConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::log;
use crate::utils::path::{normalize_path, resolve_path};

/// Default config file name.
pub const CONFIG_FILE: &str = "reload.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `reload.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub compile: CompileConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl ReloadConfig {
    /// Load, resolve, and validate a config file.
    ///
    /// A missing file yields the defaults rooted at the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_path = normalize_path(path);
        let root = config_path
            .parent()
            .map_or_else(|| PathBuf::from("."), normalize_path);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.config_path = config_path;
        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "ignoring unknown fields in {}: {}", path.display(), ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve relative paths against `root` and normalize them, so roots
    /// match the paths the watcher reports.
    pub fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        for dir in &mut self.watch.roots {
            *dir = normalize_path(&resolve_path(dir, root));
        }
        self.store.output = normalize_path(&resolve_path(&self.store.output, root));
    }

    /// Override the watched roots (e.g. from the command line).
    pub fn set_roots(&mut self, roots: &[PathBuf]) {
        self.watch.roots = roots
            .iter()
            .map(|r| normalize_path(&resolve_path(r, &self.root)))
            .collect();
    }

    /// Validate all sections, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.watch.validate(&mut diag);
        self.compile.validate(&mut diag);
        self.validate_output_placement(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Outputs written under a watched root would trigger endless passes.
    fn validate_output_placement(&self, diag: &mut ConfigDiagnostics) {
        if self.store.kind != StoreKind::File {
            return;
        }
        if let Some(root) = self
            .watch
            .roots
            .iter()
            .find(|root| self.store.output.starts_with(root))
        {
            diag.error_with_hint(
                FieldPath::new("store.output"),
                format!("output directory is inside watched root `{}`", root.display()),
                "move the output outside every [watch] root",
            );
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ReloadConfig {
    let (parsed, ignored) = ReloadConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
