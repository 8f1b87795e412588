use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One observed change, carrying the absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub entry: EntryKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, entry: EntryKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            entry,
            path: path.into(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.entry == EntryKind::File
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = match self.entry {
            EntryKind::File => "file",
            EntryKind::Directory => "dir",
        };
        write!(f, "{} {} {}", self.kind.label(), entry, self.path.display())
    }
}

/// Receives the events of an `Observer` pass.
///
/// Callbacks run synchronously on the polling thread. `on_start` and
/// `on_stop` bracket every pass, including passes without events.
pub trait Listener: Send + Sync {
    fn on_start(&self, _root: &Path) {}

    fn on_event(&self, event: &ChangeEvent);

    fn on_stop(&self, _root: &Path) {}
}
