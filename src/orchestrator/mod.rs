//! Turning filesystem passes into compile batches.
//!
//! ```text
//! Observer pass ──► CompilingListener ──► Compiler::compile_with
//!                        │                     │
//!                        │               TransactionalStore (on_start … on_stop)
//!                        ▼
//!                 ReloadListener::handle_reload  (e.g. ReloadingResolver)
//! ```

mod listener;

#[cfg(test)]
mod tests;

pub use listener::CompilingListener;

/// Notified after a pass changed published output.
pub trait ReloadListener: Send + Sync {
    fn handle_reload(&self);
}
