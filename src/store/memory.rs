use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{ResourceReader, ResourceStore};

/// In-memory resource store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(name, content)` pairs.
    pub fn with_entries<I, N, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, content)| (name.into(), content.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Sorted resource names currently stored.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResourceStore for MemoryStore {
    fn read(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.read().get(name).cloned()
    }

    fn write(&self, name: &str, data: &[u8]) {
        self.entries.write().insert(name.to_owned(), data.to_vec());
    }

    fn remove(&self, name: &str) {
        self.entries.write().remove(name);
    }
}

impl ResourceReader for MemoryStore {
    fn get_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.read(name)
    }

    fn is_available(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let store = MemoryStore::new();
        store.write("a/Simple.class", b"v1");
        store.write("a/Simple.class", b"v2");
        assert_eq!(store.read("a/Simple.class").as_deref(), Some(&b"v2"[..]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = MemoryStore::with_entries([("keep", "x")]);
        store.remove("missing");
        assert_eq!(store.names(), vec!["keep".to_string()]);
    }

    #[test]
    fn test_reader_view() {
        let store = MemoryStore::with_entries([("a/Simple.src", "class Simple {}")]);
        assert!(store.is_available("a/Simple.src"));
        assert!(!store.is_available("a/Other.src"));
        assert_eq!(
            store.get_bytes("a/Simple.src").as_deref(),
            Some(&b"class Simple {}"[..])
        );
    }
}
