use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ResourceReader, ResourceStore};
use crate::utils::name::is_valid_name;

/// Store that mirrors resource names onto files under a root directory.
///
/// `a/Simple.class` lives at `<root>/a/Simple.class`. Parent directories are
/// created on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a resource, `None` for names escaping the root.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        if !is_valid_name(name) {
            return None;
        }
        Some(name.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

impl ResourceStore for FileStore {
    fn read(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                crate::debug!("store"; "read {} failed: {}", path.display(), e);
                None
            }
        }
    }

    fn write(&self, name: &str, data: &[u8]) {
        let Some(path) = self.path_for(name) else {
            crate::log!("store"; "refusing to write invalid resource name `{}`", name);
            return;
        };

        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            crate::log!("store"; "cannot create {}: {}", parent.display(), e);
            return;
        }

        if let Err(e) = fs::write(&path, data) {
            crate::log!("store"; "write {} failed: {}", path.display(), e);
        }
    }

    fn remove(&self, name: &str) {
        let Some(path) = self.path_for(name) else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => crate::debug!("store"; "removed {}", name),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => crate::log!("store"; "remove {} failed: {}", path.display(), e),
        }
    }
}

impl ResourceReader for FileStore {
    fn get_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.read(name)
    }

    fn is_available(&self, name: &str) -> bool {
        self.path_for(name).is_some_and(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());

        store.write("a/b/Simple.class", b"bytes");

        let on_disk = temp.path().join("a").join("b").join("Simple.class");
        assert_eq!(fs::read(on_disk).unwrap(), b"bytes");
        assert_eq!(store.read("a/b/Simple.class").as_deref(), Some(&b"bytes"[..]));
    }

    #[test]
    fn test_read_missing_is_absent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        assert_eq!(store.read("nope.class"), None);
        assert!(!store.is_available("nope.class"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        store.write("x.class", b"1");
        store.remove("x.class");
        store.remove("x.class");
        assert_eq!(store.read("x.class"), None);
    }

    #[test]
    fn test_escaping_names_are_rejected() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("out");
        let store = FileStore::new(&inner);

        store.write("../escape.class", b"nope");

        assert!(!temp.path().join("escape.class").exists());
        assert_eq!(store.read("../escape.class"), None);
        assert_eq!(store.path_for("/abs"), None);
    }

    #[test]
    fn test_write_over_directory_degrades() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        fs::create_dir_all(temp.path().join("dir.class")).unwrap();

        // Swallowed and logged, never a panic.
        store.write("dir.class", b"x");
        assert_eq!(store.read("dir.class"), None);
    }
}
