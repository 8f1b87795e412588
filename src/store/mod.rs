//! Resource stores: named byte content.
//!
//! | Module          | Purpose                                         |
//! |-----------------|-------------------------------------------------|
//! | `memory`        | In-memory store (also a `ResourceReader`)       |
//! | `file`          | Store mirrored one-to-one onto a directory      |
//! | `reader`        | `FileReader` for source files under a root      |
//! | `transactional` | `on_start`/`on_stop` bracketing decorator       |
//!
//! Stores never return errors. A failed read is indistinguishable from a
//! resource that has not been produced yet, and failed writes or removals are
//! logged and dropped.

mod file;
mod memory;
mod reader;
mod transactional;

use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use reader::FileReader;
pub use transactional::{TransactionHooks, TransactionalStore, WriteLog};

/// Named byte-content repository. Last write wins.
pub trait ResourceStore: Send + Sync {
    /// Read a resource, `None` if absent or unreadable.
    fn read(&self, name: &str) -> Option<Vec<u8>>;

    /// Write a resource, replacing existing content.
    fn write(&self, name: &str, data: &[u8]);

    /// Remove a resource. Removing an absent resource is a no-op.
    fn remove(&self, name: &str);
}

/// Read-only access to source resources handed to a compiler backend.
pub trait ResourceReader: Send + Sync {
    fn get_bytes(&self, name: &str) -> Option<Vec<u8>>;

    fn is_available(&self, name: &str) -> bool {
        self.get_bytes(name).is_some()
    }
}

impl<S: ResourceStore + ?Sized> ResourceStore for Arc<S> {
    fn read(&self, name: &str) -> Option<Vec<u8>> {
        (**self).read(name)
    }

    fn write(&self, name: &str, data: &[u8]) {
        (**self).write(name, data)
    }

    fn remove(&self, name: &str) {
        (**self).remove(name)
    }
}

/// Compare two shared stores by identity (data pointer only).
pub fn same_store(a: &Arc<dyn ResourceStore>, b: &Arc<dyn ResourceStore>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
