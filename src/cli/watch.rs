//! `reloadkit watch`: poll until Ctrl+C.

use anyhow::{Context, Result};
use crossbeam::channel;
use reloadkit::config::ReloadConfig;
use reloadkit::log;

use super::common::Session;

pub fn run(config: &ReloadConfig) -> Result<()> {
    let session = Session::build(config)?;

    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to set Ctrl+C handler")?;

    session
        .monitor
        .start()
        .context("failed to start poll thread")?;

    for root in session.monitor.roots() {
        log!("watch"; "{}", root.display());
    }
    log!("watch"; "polling every {:?}, Ctrl+C to stop", session.monitor.interval());

    // A disconnected channel means the handler is gone; stop either way.
    let _ = shutdown_rx.recv();

    log!("watch"; "shutting down...");
    session.monitor.stop();
    Ok(())
}
