//! reloadkit - poll a source tree, compile what changed, republish atomically.
//!
//! # Architecture
//!
//! ```text
//! Monitor ──► Observer::check ──► CompilingListener ──► Compiler
//!                                        │                 │
//!                                        │        TransactionalStore
//!                                        ▼
//!                               ReloadingResolver::handle_reload
//! ```
//!
//! # Modules
//!
//! - `watch` - snapshot/diff of directory trees and the poll loop
//! - `store` - named byte stores and transaction bracketing
//! - `compiler` - backend contract, diagnostics, bundled backends
//! - `orchestrator` - pass events to compile batches with rollback
//! - `resolver` - lookups over an atomically swapped store set
//! - `config` - `reload.toml`
//! - `logger` - `log!` / `debug!` and the watch status line

pub mod logger;

pub mod compiler;
pub mod config;
pub mod orchestrator;
pub mod resolver;
pub mod store;
pub mod utils;
pub mod watch;

pub use compiler::{CompilationProblem, CompilationResult, Compiler, CompilerRegistry};
pub use config::ReloadConfig;
pub use orchestrator::{CompilingListener, ReloadListener};
pub use resolver::{ReloadingResolver, Resolve, ResolveError, StoreSet};
pub use store::{FileStore, MemoryStore, ResourceStore, TransactionalStore};
pub use watch::{ChangeEvent, Listener, Monitor, Observer, PassSignal};
