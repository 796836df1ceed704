use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{join, Listing, Storage, StorageError, StorageResult};

/// In-process storage keyed by full name. Directories exist implicitly.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, name: &str, content: &[u8]) -> StorageResult<String> {
        let name = join(&[name]);
        if name.is_empty() {
            return Err(StorageError::InvalidPath(name));
        }

        // Hold the write lock across name resolution so concurrent saves
        // cannot pick the same name.
        let mut files = self.files.write();
        let mut candidate = name.clone();
        while files.contains_key(&candidate) {
            candidate = super::with_random_suffix(&name);
        }
        files.insert(candidate.clone(), content.to_vec());
        Ok(candidate)
    }

    fn open(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.files
            .read()
            .get(&join(&[name]))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.files.read().contains_key(&join(&[name])))
    }

    fn listdir(&self, path: &str) -> StorageResult<Listing> {
        let dir = join(&[path]);
        let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };

        let mut directories = BTreeSet::new();
        let mut files = Vec::new();
        for key in self.files.read().keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((subdir, _)) => {
                    directories.insert(subdir.to_string());
                }
                None => files.push(rest.to_string()),
            }
        }

        if directories.is_empty() && files.is_empty() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such directory: {}", dir),
            )));
        }

        Ok((directories.into_iter().collect(), files))
    }
}
