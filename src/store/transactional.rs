//! Transaction bracketing for stores.
//!
//! `TransactionalStore` forwards every operation to the wrapped store and
//! calls its hooks around them. It buffers nothing: `on_start`/`on_stop` only
//! mark the batch boundary so a hook implementation can hold back side effects
//! (such as reload notification) until the whole batch has landed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::ResourceStore;

/// Callbacks observed by a `TransactionalStore`.
pub trait TransactionHooks: Send + Sync {
    fn on_start(&self) {}
    fn on_write(&self, _name: &str) {}
    fn on_remove(&self, _name: &str) {}
    fn on_stop(&self) {}
}

impl TransactionHooks for () {}

/// Store decorator with `on_start()`/`on_stop()` lifecycle hooks.
pub struct TransactionalStore<H: TransactionHooks = ()> {
    inner: Arc<dyn ResourceStore>,
    hooks: H,
    active: AtomicBool,
}

impl TransactionalStore<()> {
    pub fn new(inner: Arc<dyn ResourceStore>) -> Self {
        Self::with_hooks(inner, ())
    }
}

impl<H: TransactionHooks> TransactionalStore<H> {
    pub fn with_hooks(inner: Arc<dyn ResourceStore>, hooks: H) -> Self {
        Self {
            inner,
            hooks,
            active: AtomicBool::new(false),
        }
    }

    /// Begin a batch of writes/removals.
    pub fn on_start(&self) {
        if self.active.swap(true, Ordering::AcqRel) {
            crate::debug!("store"; "transaction restarted before on_stop");
        }
        self.hooks.on_start();
    }

    /// End the current batch.
    pub fn on_stop(&self) {
        self.active.store(false, Ordering::Release);
        self.hooks.on_stop();
    }

    pub fn in_transaction(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn inner(&self) -> &Arc<dyn ResourceStore> {
        &self.inner
    }
}

impl<H: TransactionHooks> ResourceStore for TransactionalStore<H> {
    fn read(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.read(name)
    }

    fn write(&self, name: &str, data: &[u8]) {
        self.inner.write(name, data);
        self.hooks.on_write(name);
    }

    fn remove(&self, name: &str) {
        self.inner.remove(name);
        self.hooks.on_remove(name);
    }
}

// ============================================================================
// WriteLog
// ============================================================================

/// Hooks that remember which names were written since `mark()`.
///
/// Lets the compile orchestrator find every output a failed batch produced,
/// including outputs whose names it could not predict.
#[derive(Debug, Default)]
pub struct WriteLog {
    written: Mutex<Vec<String>>,
}

impl WriteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything written so far.
    pub fn mark(&self) {
        self.written.lock().clear();
    }

    /// Names written since the last `mark()`, in first-write order, deduplicated.
    pub fn written(&self) -> Vec<String> {
        let written = self.written.lock();
        let mut seen = FxHashSet::default();
        written
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }
}

impl TransactionHooks for WriteLog {
    fn on_start(&self) {
        self.mark();
    }

    fn on_write(&self, name: &str) {
        self.written.lock().push(name.to_owned());
    }
}
