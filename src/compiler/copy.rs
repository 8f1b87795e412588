use super::{
    CompilationProblem, CompilationResult, Compiler, CompilerSettings, ProblemHandler, ProblemSink,
};
use crate::store::{ResourceReader, ResourceStore};

/// Identity backend: the output of `x.<source>` is the bytes of the source,
/// stored as `x.<target>`.
///
/// Missing and non-UTF-8 sources are errors, empty sources are warnings.
#[derive(Debug, Clone)]
pub struct CopyCompiler {
    source_extension: String,
    target_extension: String,
}

impl CopyCompiler {
    pub fn new(source_extension: impl Into<String>, target_extension: impl Into<String>) -> Self {
        Self {
            source_extension: source_extension.into(),
            target_extension: target_extension.into(),
        }
    }

    fn check(name: &str, bytes: &[u8]) -> Option<CompilationProblem> {
        if bytes.is_empty() {
            return Some(CompilationProblem::warning(name, "empty source"));
        }
        let err = std::str::from_utf8(bytes).err()?;
        let (line, column) = position_of(&bytes[..err.valid_up_to()]);
        Some(CompilationProblem::error(name, "source is not valid UTF-8").at(line, column))
    }
}

/// 1-based line/column of the byte just after `prefix`.
fn position_of(prefix: &[u8]) -> (u32, u32) {
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = match prefix.iter().rposition(|&b| b == b'\n') {
        Some(nl) => prefix.len() - nl,
        None => prefix.len() + 1,
    };
    (
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

impl Compiler for CopyCompiler {
    fn name(&self) -> &str {
        "copy"
    }

    fn source_extension(&self) -> &str {
        &self.source_extension
    }

    fn target_extension(&self) -> &str {
        &self.target_extension
    }

    fn compile_with(
        &self,
        sources: &[String],
        reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
        settings: &CompilerSettings,
        handler: Option<&dyn ProblemHandler>,
    ) -> CompilationResult {
        let mut sink = ProblemSink::new(settings, handler);

        for name in sources {
            let Some(bytes) = reader.get_bytes(name) else {
                if !sink.report(CompilationProblem::error(name.as_str(), "source not found")) {
                    break;
                }
                continue;
            };

            let problem = Self::check(name, &bytes);
            let failed = problem.as_ref().is_some_and(|p| p.is_error);
            if !failed {
                store.write(&self.output_name(name), &bytes);
            }
            if let Some(problem) = problem
                && !sink.report(problem)
            {
                break;
            }
        }

        sink.finish()
    }
}
