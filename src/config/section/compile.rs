//! `[compile]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compile]
//! backend = "process"                 # Registry key: "copy" or "process"
//! source_extension = "java"
//! target_extension = "class"
//! command = ["my-compiler", "--name", "{name}"]
//! mirror_resources = true             # Copy non-source files into the store
//! max_errors = 20
//! ```

use serde::{Deserialize, Serialize};

use crate::compiler::CompilerSettings;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Backend name looked up in the compiler registry.
    pub backend: String,

    /// Extension (without dot) of source files.
    pub source_extension: String,

    /// Extension (without dot) of compiled outputs.
    pub target_extension: String,

    /// Copy created/changed non-source files into the store verbatim.
    pub mirror_resources: bool,

    /// Report warnings.
    pub warnings: bool,

    /// Stop a batch after this many errors.
    pub max_errors: Option<usize>,

    /// Stop a batch after this many warnings.
    pub max_warnings: Option<usize>,

    /// Command line for the `process` backend. `{name}` expands to the source name.
    pub command: Vec<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            backend: "copy".to_string(),
            source_extension: "src".to_string(),
            target_extension: "out".to_string(),
            mirror_resources: false,
            warnings: true,
            max_errors: None,
            max_warnings: None,
            command: Vec::new(),
        }
    }
}

impl CompileConfig {
    /// Apply this section on top of a backend's default settings.
    pub fn settings(&self, mut base: CompilerSettings) -> CompilerSettings {
        base.warnings = self.warnings;
        base.max_errors = self.max_errors.or(base.max_errors);
        base.max_warnings = self.max_warnings.or(base.max_warnings);
        base
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, ext) in [
            (FieldPath::new("compile.source_extension"), &self.source_extension),
            (FieldPath::new("compile.target_extension"), &self.target_extension),
        ] {
            if ext.is_empty() {
                diag.error(field, "extension must not be empty");
            } else if ext.starts_with('.') {
                diag.error_with_hint(
                    field,
                    "extension must not start with a dot",
                    format!("use \"{}\"", ext.trim_start_matches('.')),
                );
            }
        }

        if self.source_extension == self.target_extension && self.mirror_resources {
            diag.error_with_hint(
                FieldPath::new("compile.target_extension"),
                "outputs would collide with mirrored sources",
                "pick a different target extension or disable mirror_resources",
            );
        }

        if self.max_errors == Some(0) {
            diag.error(FieldPath::new("compile.max_errors"), "must be at least 1");
        }

        if self.backend == "process" && self.command.is_empty() {
            diag.error_with_hint(
                FieldPath::new("compile.command"),
                "the process backend needs a command",
                "command = [\"my-compiler\", \"{name}\"]",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::CompilerSettings;
    use crate::config::test_parse_config;

    #[test]
    fn test_compile_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.compile.backend, "copy");
        assert_eq!(config.compile.source_extension, "src");
        assert!(!config.compile.mirror_resources);
    }

    #[test]
    fn test_settings_overlay() {
        let config = test_parse_config("[compile]\nmax_errors = 3\nwarnings = false");
        let settings = config.compile.settings(CompilerSettings::default());
        assert_eq!(settings.max_errors, Some(3));
        assert_eq!(settings.max_warnings, None);
        assert!(!settings.warnings);
    }

    #[test]
    fn test_process_command() {
        let config =
            test_parse_config("[compile]\nbackend = \"process\"\ncommand = [\"cc\", \"{name}\"]");
        assert_eq!(config.compile.command, vec!["cc", "{name}"]);
    }
}
