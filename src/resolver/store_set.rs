use std::fmt;
use std::sync::Arc;

use crate::store::{ResourceStore, same_store};

/// Immutable ordered sequence of stores.
///
/// Updates build a new set; a published set is never mutated.
#[derive(Clone, Default)]
pub struct StoreSet {
    stores: Arc<[Arc<dyn ResourceStore>]>,
}

impl StoreSet {
    pub fn new(stores: Vec<Arc<dyn ResourceStore>>) -> Self {
        Self {
            stores: stores.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceStore>> {
        self.stores.iter()
    }

    pub fn contains(&self, store: &Arc<dyn ResourceStore>) -> bool {
        self.stores.iter().any(|s| same_store(s, store))
    }

    /// Position of `store` by identity.
    pub fn position(&self, store: &Arc<dyn ResourceStore>) -> Option<usize> {
        self.stores.iter().position(|s| same_store(s, store))
    }

    /// A new set with `store` appended.
    pub fn with_store(&self, store: Arc<dyn ResourceStore>) -> Self {
        let mut stores = self.stores.to_vec();
        stores.push(store);
        Self::new(stores)
    }

    /// A new set without the first occurrence of `store`, or `None` when it
    /// is not a member.
    pub fn without_store(&self, store: &Arc<dyn ResourceStore>) -> Option<Self> {
        let index = self.position(store)?;
        let mut stores = self.stores.to_vec();
        stores.remove(index);
        Some(Self::new(stores))
    }
}

impl fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSet").field("len", &self.len()).finish()
    }
}
