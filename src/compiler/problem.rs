//! Compile diagnostics.

use std::fmt;

use super::CompilerSettings;

/// A single error or warning reported by a backend.
///
/// Lines and columns are 1-based; 0 means "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationProblem {
    pub file: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub message: String,
    pub is_error: bool,
}

impl CompilationProblem {
    pub fn error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, message, true)
    }

    pub fn warning(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, message, false)
    }

    fn new(file: impl Into<String>, message: impl Into<String>, is_error: bool) -> Self {
        Self {
            file: file.into(),
            start_line: 0,
            start_column: 0,
            end_line: 0,
            end_column: 0,
            message: message.into(),
            is_error,
        }
    }

    /// Point the problem at a single position.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.start_line = line;
        self.start_column = column;
        self.end_line = line;
        self.end_column = column;
        self
    }

    /// Extend the problem to end at a later position.
    pub fn until(mut self, line: u32, column: u32) -> Self {
        self.end_line = line;
        self.end_column = column;
        self
    }
}

impl fmt::Display for CompilationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = if self.is_error { "error" } else { "warning" };
        match (self.start_line, self.start_column) {
            (0, _) => write!(f, "{}: {}: {}", self.file, severity, self.message),
            (line, 0) => write!(f, "{}:{}: {}: {}", self.file, line, severity, self.message),
            (line, col) => write!(
                f,
                "{}:{}:{}: {}: {}",
                self.file, line, col, severity, self.message
            ),
        }
    }
}

/// Outcome of one compile batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    pub errors: Vec<CompilationProblem>,
    pub warnings: Vec<CompilationProblem>,
}

impl CompilationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Files with at least one error, deduplicated, in report order.
    pub fn failed_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for problem in &self.errors {
            if !files.contains(&problem.file.as_str()) {
                files.push(&problem.file);
            }
        }
        files
    }

    /// Render all problems, errors first, one per line.
    pub fn render(&self) -> String {
        self.errors
            .iter()
            .chain(&self.warnings)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Streaming receiver for problems as a backend discovers them.
///
/// Returning `false` asks the backend to stop the batch.
pub trait ProblemHandler: Send + Sync {
    fn handle(&self, problem: &CompilationProblem) -> bool;
}

impl<F> ProblemHandler for F
where
    F: Fn(&CompilationProblem) -> bool + Send + Sync,
{
    fn handle(&self, problem: &CompilationProblem) -> bool {
        self(problem)
    }
}

/// Accumulates problems for a backend and decides when to stop.
///
/// Applies the settings' warning switch and limits, and consults the
/// optional streaming handler.
pub struct ProblemSink<'a> {
    settings: &'a CompilerSettings,
    handler: Option<&'a dyn ProblemHandler>,
    result: CompilationResult,
    stopped: bool,
}

impl<'a> ProblemSink<'a> {
    pub fn new(settings: &'a CompilerSettings, handler: Option<&'a dyn ProblemHandler>) -> Self {
        Self {
            settings,
            handler,
            result: CompilationResult::new(),
            stopped: false,
        }
    }

    /// Record a problem. Returns `false` once the backend should stop.
    pub fn report(&mut self, problem: CompilationProblem) -> bool {
        if self.stopped {
            return false;
        }
        if !problem.is_error && !self.settings.warnings {
            return true;
        }

        if let Some(handler) = self.handler
            && !handler.handle(&problem)
        {
            self.stopped = true;
        }

        if problem.is_error {
            self.result.errors.push(problem);
        } else {
            self.result.warnings.push(problem);
        }

        let over_errors = self
            .settings
            .max_errors
            .is_some_and(|max| self.result.errors.len() >= max);
        let over_warnings = self
            .settings
            .max_warnings
            .is_some_and(|max| self.result.warnings.len() >= max);
        if over_errors || over_warnings {
            self.stopped = true;
        }

        !self.stopped
    }

    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    pub fn finish(self) -> CompilationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_problem_display() {
        let p = CompilationProblem::error("a/Simple.src", "unexpected token").at(3, 7);
        assert_eq!(p.to_string(), "a/Simple.src:3:7: error: unexpected token");

        let p = CompilationProblem::warning("a/Simple.src", "empty source");
        assert_eq!(p.to_string(), "a/Simple.src: warning: empty source");
    }

    #[test]
    fn test_failed_files_dedup() {
        let result = CompilationResult {
            errors: vec![
                CompilationProblem::error("a.src", "one"),
                CompilationProblem::error("b.src", "two"),
                CompilationProblem::error("a.src", "three"),
            ],
            warnings: vec![],
        };
        assert_eq!(result.failed_files(), vec!["a.src", "b.src"]);
        assert!(result.has_errors());
        assert!(!result.is_clean());
    }

    #[test]
    fn test_sink_max_errors() {
        let settings = CompilerSettings::default().with_max_errors(2);
        let mut sink = ProblemSink::new(&settings, None);

        assert!(sink.report(CompilationProblem::error("a", "1")));
        assert!(!sink.report(CompilationProblem::error("a", "2")));
        assert!(sink.should_stop());
        assert!(!sink.report(CompilationProblem::error("a", "3")));
        assert_eq!(sink.finish().errors.len(), 2);
    }

    #[test]
    fn test_sink_handler_stops_early() {
        let settings = CompilerSettings::default();
        let seen = AtomicUsize::new(0);
        let handler = |_: &CompilationProblem| seen.fetch_add(1, Ordering::SeqCst) < 1;
        let mut sink = ProblemSink::new(&settings, Some(&handler));

        assert!(sink.report(CompilationProblem::warning("a", "w1")));
        assert!(!sink.report(CompilationProblem::warning("a", "w2")));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(sink.finish().warnings.len(), 2);
    }

    #[test]
    fn test_sink_drops_warnings_when_disabled() {
        let settings = CompilerSettings::default().without_warnings();
        let mut sink = ProblemSink::new(&settings, None);
        sink.report(CompilationProblem::warning("a", "ignored"));
        sink.report(CompilationProblem::error("a", "kept"));
        let result = sink.finish();
        assert!(result.warnings.is_empty());
        assert_eq!(result.errors.len(), 1);
    }
}
