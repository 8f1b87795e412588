use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::{Compiler, CopyCompiler, ProcessCompiler};
use crate::config::CompileConfig;

/// Builds a backend from the `[compile]` section.
pub type CompilerFactory =
    Box<dyn Fn(&CompileConfig) -> Result<Arc<dyn Compiler>, RegistryError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown compiler backend `{name}` (available: {available})")]
    Unknown { name: String, available: String },

    #[error("compiler backend `{backend}` is misconfigured: {reason}")]
    Misconfigured { backend: String, reason: String },
}

/// Compiler backends keyed by name.
pub struct CompilerRegistry {
    factories: FxHashMap<String, CompilerFactory>,
}

impl CompilerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Registry with the bundled `copy` and `process` backends.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register("copy", |config: &CompileConfig| {
            Ok(Arc::new(CopyCompiler::new(
                &config.source_extension,
                &config.target_extension,
            )) as Arc<dyn Compiler>)
        });

        registry.register("process", |config: &CompileConfig| {
            ProcessCompiler::new(
                &config.command,
                &config.source_extension,
                &config.target_extension,
            )
            .map(|c| Arc::new(c) as Arc<dyn Compiler>)
            .ok_or_else(|| RegistryError::Misconfigured {
                backend: "process".into(),
                reason: "`compile.command` must name a program".into(),
            })
        });

        registry
    }

    /// Register (or replace) a backend factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&CompileConfig) -> Result<Arc<dyn Compiler>, RegistryError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the backend named by `config.backend`.
    pub fn create(&self, config: &CompileConfig) -> Result<Arc<dyn Compiler>, RegistryError> {
        let factory = self
            .factories
            .get(&config.backend)
            .ok_or_else(|| RegistryError::Unknown {
                name: config.backend.clone(),
                available: self.names().join(", "),
            })?;
        factory(config)
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let registry = CompilerRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["copy", "process"]);
    }

    #[test]
    fn test_create_copy() {
        let registry = CompilerRegistry::with_builtins();
        let config = CompileConfig {
            source_extension: "java".into(),
            target_extension: "class".into(),
            ..CompileConfig::default()
        };

        let compiler = registry.create(&config).unwrap();
        assert_eq!(compiler.name(), "copy");
        assert_eq!(compiler.output_name("a/Simple.java"), "a/Simple.class");
    }

    #[test]
    fn test_unknown_backend() {
        let registry = CompilerRegistry::with_builtins();
        let config = CompileConfig {
            backend: "janino".into(),
            ..CompileConfig::default()
        };

        let err = registry.create(&config).err().unwrap();
        let message = err.to_string();
        assert!(message.contains("janino"));
        assert!(message.contains("copy, process"));
    }

    #[test]
    fn test_process_requires_command() {
        let registry = CompilerRegistry::with_builtins();
        let config = CompileConfig {
            backend: "process".into(),
            ..CompileConfig::default()
        };
        assert!(matches!(
            registry.create(&config),
            Err(RegistryError::Misconfigured { .. })
        ));
    }

    #[test]
    fn test_register_custom() {
        let mut registry = CompilerRegistry::new();
        registry.register("upper", |c: &CompileConfig| {
            Ok(Arc::new(CopyCompiler::new(&c.source_extension, "up")) as Arc<dyn Compiler>)
        });
        assert!(registry.contains("upper"));
        assert!(!registry.contains("copy"));
    }
}
