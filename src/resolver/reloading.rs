//! `ReloadingResolver`: lock-free lookups over a swappable chain.
//!
//! ```text
//! resolve(name) ── load chain once ──► memo hit?  ──► content
//!                                      │ miss
//!                                      ▼
//!                               stores in order ──► parent ──► NotFound
//! ```
//!
//! Every update (`add_store`, `remove_store`, `handle_reload`) publishes a
//! fresh chain with an empty memo through `ArcSwap::rcu`. A lookup that
//! already loaded the old chain finishes against it, so no caller ever sees a
//! half-updated store list.

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use super::{Resolve, ResolveError, StoreSet};
use crate::debug;
use crate::orchestrator::ReloadListener;
use crate::store::ResourceStore;

/// One generation: a store set and what has been resolved from it.
struct Chain {
    stores: StoreSet,
    memo: DashMap<String, Arc<[u8]>>,
}

impl Chain {
    fn new(stores: StoreSet) -> Self {
        Self {
            stores,
            memo: DashMap::new(),
        }
    }
}

pub struct ReloadingResolver {
    chain: ArcSwap<Chain>,
    parent: Option<Arc<dyn Resolve>>,
}

impl ReloadingResolver {
    pub fn new() -> Self {
        Self {
            chain: ArcSwap::from_pointee(Chain::new(StoreSet::default())),
            parent: None,
        }
    }

    /// Fall back to `parent` for names no store holds.
    pub fn with_parent(parent: Arc<dyn Resolve>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new()
        }
    }

    /// Current store set.
    pub fn stores(&self) -> StoreSet {
        self.chain.load().stores.clone()
    }

    /// Append a store and publish the new set.
    pub fn add_store(&self, store: Arc<dyn ResourceStore>) {
        self.chain
            .rcu(|current| Chain::new(current.stores.with_store(Arc::clone(&store))));
    }

    /// Remove a store by identity and publish the new set.
    ///
    /// Returns `false` without publishing anything if it was not registered.
    pub fn remove_store(&self, store: &Arc<dyn ResourceStore>) -> bool {
        let mut removed = false;
        self.chain.rcu(|current| match current.stores.without_store(store) {
            Some(stores) => {
                removed = true;
                Arc::new(Chain::new(stores))
            }
            None => {
                removed = false;
                Arc::clone(current)
            }
        });
        removed
    }
}

impl Default for ReloadingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for ReloadingResolver {
    fn resolve(&self, name: &str) -> Result<Arc<[u8]>, ResolveError> {
        let chain = self.chain.load_full();

        if let Some(hit) = chain.memo.get(name) {
            return Ok(Arc::clone(hit.value()));
        }

        for store in chain.stores.iter() {
            if let Some(content) = store.read(name) {
                let content: Arc<[u8]> = content.into();
                chain.memo.insert(name.to_owned(), Arc::clone(&content));
                return Ok(content);
            }
        }

        match &self.parent {
            Some(parent) => parent.resolve(name),
            None => Err(ResolveError::NotFound(name.to_owned())),
        }
    }
}

impl ReloadListener for ReloadingResolver {
    /// Publish a fresh chain over the same stores so every name is looked up
    /// again.
    fn handle_reload(&self) {
        self.chain.rcu(|current| Chain::new(current.stores.clone()));
        debug!("resolve"; "reloaded {} store(s)", self.chain.load().stores.len());
    }
}
