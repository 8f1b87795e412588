//! Compiler backend contract.
//!
//! A backend is a function from a batch of source names plus a reader to a
//! `CompilationResult`, writing its outputs into a store as it goes.
//!
//! # Module Structure
//!
//! - `problem` - `CompilationProblem`, `CompilationResult`, streaming handlers
//! - `settings` - `CompilerSettings`
//! - `registry` - backends selected by name
//! - `copy` - identity backend
//! - `process` - backend that runs an external command per source

mod copy;
mod problem;
mod process;
mod registry;
mod settings;

pub use copy::CopyCompiler;
pub use problem::{CompilationProblem, CompilationResult, ProblemHandler, ProblemSink};
pub use process::ProcessCompiler;
pub use registry::{CompilerFactory, CompilerRegistry, RegistryError};
pub use settings::CompilerSettings;

use crate::store::{ResourceReader, ResourceStore};
use crate::utils::name::{has_extension, retarget};

/// A compiler backend.
pub trait Compiler: Send + Sync {
    /// Registry name of this backend.
    fn name(&self) -> &str;

    /// Extension (without dot) of the sources this backend recognizes.
    fn source_extension(&self) -> &str;

    /// Extension (without dot) of the outputs this backend produces.
    fn target_extension(&self) -> &str;

    fn is_source(&self, name: &str) -> bool {
        has_extension(name, self.source_extension())
    }

    /// Output resource produced for a source: strip extension then retarget.
    fn output_name(&self, source: &str) -> String {
        retarget(source, self.target_extension())
    }

    fn create_default_settings(&self) -> CompilerSettings {
        CompilerSettings::default()
    }

    /// Compile `sources`, writing outputs into `store`.
    ///
    /// `handler` sees every problem as it is discovered and may stop the
    /// batch early by returning `false`.
    fn compile_with(
        &self,
        sources: &[String],
        reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
        settings: &CompilerSettings,
        handler: Option<&dyn ProblemHandler>,
    ) -> CompilationResult;

    /// Compile with default settings and no streaming handler.
    fn compile(
        &self,
        sources: &[String],
        reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
    ) -> CompilationResult {
        let settings = self.create_default_settings();
        self.compile_with(sources, reader, store, &settings, None)
    }
}
