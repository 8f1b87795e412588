//! Pass synchronisation for tests and tooling.
//!
//! `PassSignal` is a listener that drops a token on a bounded channel at the
//! end of every pass, and another when that pass saw at least one event.
//! Waiters block on the token with an explicit timeout.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use thiserror::Error;

use super::{ChangeEvent, Listener};

/// Tokens kept before new ones are dropped.
const CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    #[error("no signal within {0:?}")]
    Timeout(Duration),
}

pub struct PassSignal {
    pass_tx: Sender<()>,
    pass_rx: Receiver<()>,
    change_tx: Sender<()>,
    change_rx: Receiver<()>,
    saw_event: AtomicBool,
}

impl PassSignal {
    pub fn new() -> Self {
        let (pass_tx, pass_rx) = channel::bounded(CAPACITY);
        let (change_tx, change_rx) = channel::bounded(CAPACITY);
        Self {
            pass_tx,
            pass_rx,
            change_tx,
            change_rx,
            saw_event: AtomicBool::new(false),
        }
    }

    /// Block until a pass completes.
    pub fn wait_for_pass(&self, timeout: Duration) -> Result<(), WaitError> {
        self.pass_rx
            .recv_timeout(timeout)
            .map_err(|_| WaitError::Timeout(timeout))
    }

    /// Block until a pass with at least one event completes.
    pub fn wait_for_change(&self, timeout: Duration) -> Result<(), WaitError> {
        self.change_rx
            .recv_timeout(timeout)
            .map_err(|_| WaitError::Timeout(timeout))
    }

    /// Discard tokens from passes that already happened.
    pub fn drain(&self) {
        while self.pass_rx.try_recv().is_ok() {}
        while self.change_rx.try_recv().is_ok() {}
    }
}

impl Default for PassSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for PassSignal {
    fn on_start(&self, _root: &Path) {
        self.saw_event.store(false, Ordering::Release);
    }

    fn on_event(&self, _event: &ChangeEvent) {
        self.saw_event.store(true, Ordering::Release);
    }

    fn on_stop(&self, _root: &Path) {
        if self.saw_event.swap(false, Ordering::AcqRel) {
            let _ = self.change_tx.try_send(());
        }
        let _ = self.pass_tx.try_send(());
    }
}
