use std::fs;
use std::path::{Path, PathBuf};

use super::ResourceReader;
use crate::utils::name::is_valid_name;

/// Reads source resources from files under a root directory.
#[derive(Debug, Clone)]
pub struct FileReader {
    root: PathBuf,
}

impl FileReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        is_valid_name(name)
            .then(|| name.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

impl ResourceReader for FileReader {
    fn get_bytes(&self, name: &str) -> Option<Vec<u8>> {
        fs::read(self.path_for(name)?).ok()
    }

    fn is_available(&self, name: &str) -> bool {
        self.path_for(name).is_some_and(|p| p.is_file())
    }
}
