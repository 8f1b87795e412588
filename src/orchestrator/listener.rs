//! `CompilingListener`: one compile batch per poll pass.
//!
//! At the end of a pass:
//!
//! 1. outputs of deleted sources are removed
//! 2. mirrored (non-source) resources are copied or removed
//! 3. created then changed sources form one batch, compiled in one call
//! 4. a batch with errors has every output it could have produced removed
//! 5. the store transaction closes and reload listeners are notified
//!
//! A failed batch never leaves a partial set of outputs behind, so a reload
//! after failure republishes exactly the state from before the batch, minus
//! the failed sources' outputs.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::ReloadListener;
use crate::compiler::{
    CompilationProblem, CompilationResult, Compiler, CompilerSettings, ProblemHandler,
};
use crate::store::{FileReader, ResourceReader, ResourceStore, TransactionalStore, WriteLog};
use crate::utils::name::resource_name;
use crate::utils::path::normalize_path;
use crate::watch::{ChangeEvent, ChangeKind, Listener};
use crate::{debug, log};

/// Resource names touched during the current pass.
#[derive(Debug, Default)]
struct PassSet {
    created: Vec<String>,
    changed: Vec<String>,
    deleted: Vec<String>,
}

impl PassSet {
    fn is_empty(&self) -> bool {
        self.created.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }
}

pub struct CompilingListener {
    root: PathBuf,
    compiler: Arc<dyn Compiler>,
    reader: Arc<dyn ResourceReader>,
    store: TransactionalStore<WriteLog>,
    settings: CompilerSettings,
    handler: Option<Arc<dyn ProblemHandler>>,
    mirror_resources: bool,
    pass: Mutex<PassSet>,
    reload_listeners: ArcSwap<Vec<Arc<dyn ReloadListener>>>,
    last_result: ArcSwapOption<CompilationResult>,
}

impl CompilingListener {
    /// Compile sources found under `root` into `store`.
    ///
    /// Sources are read from disk through a `FileReader` over `root`, with
    /// the backend's default settings.
    pub fn new(
        root: impl Into<PathBuf>,
        compiler: Arc<dyn Compiler>,
        store: Arc<dyn ResourceStore>,
    ) -> Self {
        let root = normalize_path(&root.into());
        Self {
            reader: Arc::new(FileReader::new(root.clone())),
            settings: compiler.create_default_settings(),
            store: TransactionalStore::with_hooks(store, WriteLog::new()),
            root,
            compiler,
            handler: None,
            mirror_resources: false,
            pass: Mutex::new(PassSet::default()),
            reload_listeners: ArcSwap::from_pointee(Vec::new()),
            last_result: ArcSwapOption::empty(),
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn ResourceReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_settings(mut self, settings: CompilerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stream problems to `handler` as the backend reports them.
    pub fn with_problem_handler(mut self, handler: Arc<dyn ProblemHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Also copy non-source files into the store verbatim.
    pub fn with_mirror_resources(mut self, mirror: bool) -> Self {
        self.mirror_resources = mirror;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    pub fn store(&self) -> &TransactionalStore<WriteLog> {
        &self.store
    }

    pub fn add_reload_listener(&self, listener: Arc<dyn ReloadListener>) {
        self.reload_listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&listener));
            next
        });
    }

    pub fn remove_reload_listener(&self, listener: &Arc<dyn ReloadListener>) -> bool {
        let mut removed = false;
        self.reload_listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
            removed = next.len() != current.len();
            next
        });
        removed
    }

    /// Result of the most recent compile batch, if any ran yet.
    pub fn last_result(&self) -> Option<Arc<CompilationResult>> {
        self.last_result.load_full()
    }

    // ------------------------------------------------------------------------
    // pass handling
    // ------------------------------------------------------------------------

    /// Apply a finished pass to the store. Returns whether a reload is needed.
    fn apply(&self, pass: PassSet) -> bool {
        let mut reload = false;

        for name in &pass.deleted {
            if self.compiler.is_source(name) {
                let output = self.compiler.output_name(name);
                debug!("compile"; "removing {}", output);
                self.store.remove(&output);
                reload = true;
            } else if self.mirror_resources {
                self.store.remove(name);
                reload = true;
            }
        }

        let mut seen = FxHashSet::default();
        let mut batch = Vec::new();
        for name in pass.created.iter().chain(&pass.changed) {
            if !seen.insert(name.as_str()) {
                continue;
            }
            if self.compiler.is_source(name) {
                batch.push(name.clone());
            } else if self.mirror_resources {
                reload |= self.mirror(name);
            }
        }

        if !batch.is_empty() {
            self.compile_batch(&batch);
            reload = true;
        }

        reload
    }

    fn mirror(&self, name: &str) -> bool {
        match self.reader.get_bytes(name) {
            Some(content) => {
                debug!("compile"; "mirroring {}", name);
                self.store.write(name, &content);
                true
            }
            None => {
                debug!("compile"; "{} vanished before it could be mirrored", name);
                false
            }
        }
    }

    fn compile_batch(&self, batch: &[String]) {
        debug!("compile"; "compiling {} source(s) with {}", batch.len(), self.compiler.name());

        // Only writes made by the backend count for rollback.
        self.store.hooks().mark();

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.compiler.compile_with(
                batch,
                self.reader.as_ref(),
                &self.store,
                &self.settings,
                self.handler.as_deref(),
            )
        }))
        .unwrap_or_else(|_| {
            log!("error"; "compiler `{}` panicked", self.compiler.name());
            CompilationResult {
                errors: vec![CompilationProblem::error(
                    batch[0].as_str(),
                    format!("compiler `{}` panicked", self.compiler.name()),
                )],
                warnings: Vec::new(),
            }
        });

        if result.has_errors() {
            self.roll_back(batch);
            log!("compile"; "{} error(s) in batch of {}, outputs rolled back", result.errors.len(), batch.len());
        } else {
            debug!("compile"; "compiled {} source(s), {} warning(s)", batch.len(), result.warnings.len());
        }

        self.last_result.store(Some(Arc::new(result)));
    }

    /// Remove every output the batch was expected to produce plus every name
    /// the backend actually wrote.
    fn roll_back(&self, batch: &[String]) {
        let mut doomed: Vec<String> = batch.iter().map(|s| self.compiler.output_name(s)).collect();
        for name in self.store.hooks().written() {
            if !doomed.contains(&name) {
                doomed.push(name);
            }
        }
        for name in &doomed {
            self.store.remove(name);
        }
    }

    fn notify_reload(&self) {
        for listener in self.reload_listeners.load().iter() {
            if catch_unwind(AssertUnwindSafe(|| listener.handle_reload())).is_err() {
                log!("error"; "reload listener panicked");
            }
        }
    }
}

impl Listener for CompilingListener {
    fn on_start(&self, _root: &Path) {
        *self.pass.lock() = PassSet::default();
        self.store.on_start();
    }

    fn on_event(&self, event: &ChangeEvent) {
        if !event.is_file() {
            return;
        }
        let Some(name) = resource_name(&self.root, event.path()) else {
            debug!("compile"; "{} is outside {}", event.path().display(), self.root.display());
            return;
        };

        let mut pass = self.pass.lock();
        match event.kind {
            ChangeKind::Created => pass.created.push(name),
            ChangeKind::Changed => pass.changed.push(name),
            ChangeKind::Deleted => pass.deleted.push(name),
        }
    }

    fn on_stop(&self, _root: &Path) {
        let pass = std::mem::take(&mut *self.pass.lock());

        let reload = !pass.is_empty() && self.apply(pass);
        self.store.on_stop();

        if reload {
            self.notify_reload();
        }
    }
}
