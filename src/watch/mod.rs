//! Polling filesystem watcher.
//!
//! # Architecture
//!
//! ```text
//! Monitor (poll thread)
//!   └── Observer per root ── snapshot Tree ── diff ──► Listener callbacks
//! ```
//!
//! No OS notification is used: every pass stats the tree and compares it to
//! the snapshot of the previous pass.
//!
//! # Module Structure
//!
//! - `event` - `ChangeEvent` and the `Listener` trait
//! - `node` - snapshot arena
//! - `observer` - one root's diff algorithm
//! - `monitor` - poll thread and listener registration
//! - `signal` - `PassSignal` tokens for synchronising with passes

mod event;
mod monitor;
mod node;
mod observer;
mod signal;


pub use event::{ChangeEvent, ChangeKind, EntryKind, Listener};
pub use monitor::Monitor;
pub use observer::Observer;
pub use signal::{PassSignal, WaitError};
