//! Wiring shared by `watch` and `check`.

use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use reloadkit::compiler::{CompilationResult, CompilerRegistry};
use reloadkit::config::{ReloadConfig, StoreKind};
use reloadkit::logger::{status_error, status_success, status_warning};
use reloadkit::store::{FileStore, MemoryStore, ResourceStore};
use reloadkit::{CompilingListener, Monitor, ReloadListener, ReloadingResolver, log};

/// Everything one invocation runs: a monitor with one compiling listener per
/// root, publishing into a shared store behind a resolver.
pub struct Session {
    pub monitor: Monitor,
    pub resolver: Arc<ReloadingResolver>,
    pub listeners: Vec<Arc<CompilingListener>>,
}

impl Session {
    pub fn build(config: &ReloadConfig) -> Result<Self> {
        let compiler = CompilerRegistry::with_builtins()
            .create(&config.compile)
            .context("failed to create compiler backend")?;
        let settings = config.compile.settings(compiler.create_default_settings());

        let store: Arc<dyn ResourceStore> = match config.store.kind {
            StoreKind::File => Arc::new(FileStore::new(config.store.output.clone())),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        };

        let resolver = Arc::new(ReloadingResolver::new());
        resolver.add_store(Arc::clone(&store));

        let monitor = Monitor::new();
        monitor.set_interval(config.watch.interval_ms);

        let mut listeners = Vec::with_capacity(config.watch.roots.len());
        for root in &config.watch.roots {
            if !root.is_dir() {
                log!("watch"; "{} does not exist yet", root.display());
            }

            let listener = Arc::new(
                CompilingListener::new(root.clone(), Arc::clone(&compiler), Arc::clone(&store))
                    .with_settings(settings.clone())
                    .with_mirror_resources(config.compile.mirror_resources),
            );
            listener.add_reload_listener(resolver.clone());
            listener.add_reload_listener(Arc::new(StatusReport::new(&listener)));

            monitor.add_listener(root, listener.clone());
            listeners.push(listener);
        }

        Ok(Self {
            monitor,
            resolver,
            listeners,
        })
    }

    /// Most recent batch result of every root that compiled something.
    pub fn results(&self) -> Vec<Arc<CompilationResult>> {
        self.listeners
            .iter()
            .filter_map(|l| l.last_result())
            .collect()
    }
}

/// Shows the outcome of each reload on the watch status line.
struct StatusReport {
    source: Weak<CompilingListener>,
    shown: Mutex<Option<Arc<CompilationResult>>>,
}

impl StatusReport {
    fn new(source: &Arc<CompilingListener>) -> Self {
        Self {
            source: Arc::downgrade(source),
            shown: Mutex::new(None),
        }
    }
}

impl ReloadListener for StatusReport {
    fn handle_reload(&self) {
        let Some(source) = self.source.upgrade() else {
            return;
        };
        let root = source.root().display().to_string();

        let result = source.last_result();
        let mut shown = self.shown.lock();
        let fresh = match (&result, &*shown) {
            (Some(now), Some(before)) => !Arc::ptr_eq(now, before),
            (Some(_), None) => true,
            (None, _) => false,
        };

        match result.as_deref() {
            Some(r) if fresh && r.has_errors() => status_error(
                &format!("{} error(s) in {}", r.errors.len(), root),
                &r.render(),
            ),
            Some(r) if fresh && !r.warnings.is_empty() => status_warning(&r.render()),
            Some(_) if fresh => status_success(&format!("compiled {root}")),
            _ => status_success(&format!("removed stale outputs in {root}")),
        }
        *shown = result;
    }
}
