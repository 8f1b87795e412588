//! Configuration section definitions.
//!
//! Each module corresponds to a section in `reload.toml`:
//!
//! | Module    | TOML Section  | Purpose                                  |
//! |-----------|---------------|------------------------------------------|
//! | `watch`   | `[watch]`     | Watched roots and poll interval          |
//! | `compile` | `[compile]`   | Backend selection and compiler settings  |
//! | `store`   | `[store]`     | Where compiled output is published       |

mod compile;
mod store;
mod watch;

pub use compile::CompileConfig;
pub use store::{StoreConfig, StoreKind};
pub use watch::{DEFAULT_INTERVAL_MS, WatchConfig};
