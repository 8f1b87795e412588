//! Background poll loop over a set of observers.
//!
//! ```text
//! start() ──► [poll thread] loop { check every observer; wait(interval | wake) }
//! stop()  ──► running = false ──► wake ──► join (bounded by one interval)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arc_swap::ArcSwap;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{Listener, Observer};
use crate::config::section::DEFAULT_INTERVAL_MS;
use crate::utils::path::normalize_path;
use crate::{debug, log};

/// State shared with the poll thread.
struct Shared {
    observers: ArcSwap<FxHashMap<PathBuf, Arc<Observer>>>,
    interval_ms: AtomicU64,
    running: AtomicBool,
}

impl Shared {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Relaxed))
    }

    fn check_all(&self) -> usize {
        let observers = self.observers.load_full();
        observers.values().map(|observer| observer.check()).sum()
    }
}

/// Handle to a running poll thread.
struct Worker {
    handle: JoinHandle<()>,
    wake_tx: Sender<()>,
    done_rx: Receiver<()>,
}

/// Polls every registered root once per interval on a dedicated thread.
pub struct Monitor {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                observers: ArcSwap::from_pointee(FxHashMap::default()),
                interval_ms: AtomicU64::new(DEFAULT_INTERVAL_MS),
                running: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Register a listener for `root`, creating its observer on first use.
    ///
    /// Listeners on the same root share one observer (and one snapshot).
    pub fn add_listener(&self, root: &Path, listener: Arc<dyn Listener>) -> Arc<Observer> {
        let key = normalize_path(root);

        let fresh = Arc::new(Observer::new(key.clone()));
        let mut observer = Arc::clone(&fresh);
        self.shared.observers.rcu(|current| {
            let mut next = FxHashMap::clone(current);
            observer = Arc::clone(next.entry(key.clone()).or_insert_with(|| Arc::clone(&fresh)));
            next
        });

        if Arc::ptr_eq(&observer, &fresh) {
            debug!("monitor"; "observing {}", key.display());
        }
        observer.add_listener(listener);
        observer
    }

    /// Remove a listener from every observer. Returns whether any held it.
    pub fn remove_listener(&self, listener: &Arc<dyn Listener>) -> bool {
        let observers = self.shared.observers.load();
        let mut removed = false;
        for observer in observers.values() {
            removed |= observer.remove_listener(listener);
        }
        removed
    }

    pub fn observer(&self, root: &Path) -> Option<Arc<Observer>> {
        self.shared.observers.load().get(&normalize_path(root)).cloned()
    }

    /// Watched roots, sorted.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<_> = self.shared.observers.load().keys().cloned().collect();
        roots.sort();
        roots
    }

    /// Set the delay between passes in milliseconds (at least 1).
    pub fn set_interval(&self, ms: u64) {
        self.shared.interval_ms.store(ms.max(1), Ordering::Relaxed);
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Run one pass over every observer on the calling thread.
    pub fn check_now(&self) -> usize {
        self.shared.check_all()
    }

    /// Spawn the poll thread. Starting a running monitor is a no-op.
    pub fn start(&self) -> std::io::Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            debug!("monitor"; "already running");
            return Ok(());
        }

        let (wake_tx, wake_rx) = channel::bounded::<()>(1);
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        shared.running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name("reloadkit-monitor".into())
            .spawn(move || {
                poll_loop(&shared, &wake_rx);
                let _ = done_tx.send(());
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                return Err(e);
            }
        };

        debug!("monitor"; "started, interval {:?}", self.interval());
        *worker = Some(Worker {
            handle,
            wake_tx,
            done_rx,
        });
        Ok(())
    }

    /// Stop polling. An in-flight pass completes; the thread is joined for at
    /// most one interval and detached after that.
    pub fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        self.shared.running.store(false, Ordering::Release);
        let _ = worker.wake_tx.try_send(());

        match worker.done_rx.recv_timeout(self.interval()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    log!("monitor"; "poll thread panicked");
                }
                debug!("monitor"; "stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                log!("monitor"; "poll thread still busy after {:?}, detaching", self.interval());
            }
        }
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(shared: &Shared, wake_rx: &Receiver<()>) {
    while shared.running.load(Ordering::Acquire) {
        shared.check_all();

        match wake_rx.recv_timeout(shared.interval()) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
