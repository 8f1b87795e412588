//! Name resolution over an atomically swappable set of stores.
//!
//! # Module Structure
//!
//! - `store_set` - immutable ordered `StoreSet`
//! - `reloading` - `ReloadingResolver` and its memoizing chain

mod reloading;
mod store_set;


use std::sync::Arc;

use thiserror::Error;

pub use reloading::ReloadingResolver;
pub use store_set::StoreSet;

use crate::store::ResourceStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("resource not found: {0}")]
    NotFound(String),
}

/// Looks up resource content by name.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Arc<[u8]>, ResolveError>;
}

/// Resolves straight from a single store, e.g. as a parent of a
/// `ReloadingResolver`.
pub struct StoreResolver(pub Arc<dyn ResourceStore>);

impl Resolve for StoreResolver {
    fn resolve(&self, name: &str) -> Result<Arc<[u8]>, ResolveError> {
        self.0
            .read(name)
            .map(Arc::from)
            .ok_or_else(|| ResolveError::NotFound(name.to_owned()))
    }
}
