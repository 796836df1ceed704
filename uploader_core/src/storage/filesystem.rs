use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{Listing, Storage, StorageError, StorageResult};

/// Lost races tolerated before `save` gives up on a name.
const MAX_SAVE_ATTEMPTS: usize = 16;

/// Storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a storage name below the root, rejecting absolute paths and
    /// `..` components.
    fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(name);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(name.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }

    fn write_new(&self, name: &str, content: &[u8]) -> StorageResult<()> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| match err.kind() {
                // Some component of the parent is a regular file.
                ErrorKind::AlreadyExists => StorageError::InvalidPath(name.to_string()),
                _ => StorageError::Io(err),
            })?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(content)?;
        file.sync_all()?;

        debug!(name = %name, path = ?path, size = content.len(), "file written");
        Ok(())
    }
}

impl Storage for FileSystemStorage {
    fn save(&self, name: &str, content: &[u8]) -> StorageResult<String> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let available = self.get_available_name(name)?;
            match self.write_new(&available, content) {
                Ok(()) => return Ok(available),
                // Another request claimed the name between the check and the write.
                Err(StorageError::Io(err)) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(name = %available, "name claimed concurrently, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {} after {} attempts", name, MAX_SAVE_ATTEMPTS),
        )))
    }

    fn open(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::Io(err),
        })
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.resolve(name)?.exists())
    }

    fn listdir(&self, path: &str) -> StorageResult<Listing> {
        let dir = self.resolve(path)?;
        let mut directories = Vec::new();
        let mut files = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, so a linked directory is walked as one.
            if entry.path().is_dir() {
                directories.push(name);
            } else {
                files.push(name);
            }
        }

        directories.sort();
        files.sort();
        Ok((directories, files))
    }
}
