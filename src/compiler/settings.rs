/// Options shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Encoding sources are expected in.
    pub source_encoding: String,
    /// Report warnings (errors are always reported).
    pub warnings: bool,
    /// Emit debug information where the backend supports it.
    pub debug: bool,
    /// Stop the batch after this many errors.
    pub max_errors: Option<usize>,
    /// Stop the batch after this many warnings.
    pub max_warnings: Option<usize>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            source_encoding: "UTF-8".to_string(),
            warnings: true,
            debug: true,
            max_errors: None,
            max_warnings: None,
        }
    }
}

impl CompilerSettings {
    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }

    pub fn with_max_warnings(mut self, max: usize) -> Self {
        self.max_warnings = Some(max);
        self
    }

    pub fn without_warnings(mut self) -> Self {
        self.warnings = false;
        self
    }
}
