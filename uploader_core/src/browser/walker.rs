use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::UploaderConfig;
use crate::media::is_thumbnail;
use crate::middleware::remote_user::AuthUser;
use crate::storage::{join, Storage, StorageError};

/// Enumerates uploaded files below the browse root of one user.
#[derive(Clone)]
pub struct FileLister {
    storage: Arc<dyn Storage>,
    root: String,
}

impl FileLister {
    /// Non-superusers are confined to their own directory when uploads are
    /// restricted by user.
    pub fn new(storage: Arc<dyn Storage>, config: &UploaderConfig, user: Option<&AuthUser>) -> Self {
        let user_path = match user {
            Some(user) if config.restrict_by_user && !user.is_superuser => user.username.as_str(),
            _ => "",
        };

        Self {
            storage,
            root: join(&[config.upload_path.as_str(), user_path]),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn files(&self) -> ImageFiles {
        self.files_under("")
    }

    /// Starts a fresh walk at `path`, relative to the browse root.
    pub fn files_under(&self, path: &str) -> ImageFiles {
        ImageFiles {
            storage: Arc::clone(&self.storage),
            pending_dirs: vec![join(&[self.root.as_str(), path])],
            pending_files: VecDeque::new(),
        }
    }
}

/// Depth-first walk over storage, yielding full storage names of files.
///
/// A directory's files come before its subdirectories. Dot entries and
/// thumbnails are skipped. Directories the storage cannot list contribute
/// nothing.
pub struct ImageFiles {
    storage: Arc<dyn Storage>,
    pending_dirs: Vec<String>,
    pending_files: VecDeque<String>,
}

impl ImageFiles {
    fn expand(&mut self, dir: &str) {
        let (directories, files) = match self.storage.listdir(dir) {
            Ok(listing) => listing,
            Err(StorageError::Unsupported(op)) => {
                debug!(dir = %dir, op, "storage cannot list, skipping");
                return;
            }
            Err(StorageError::Io(err)) => {
                debug!(dir = %dir, error = %err, "cannot list directory, skipping");
                return;
            }
            Err(err) => {
                warn!(dir = %dir, error = %err, "unexpected listing failure, skipping");
                return;
            }
        };

        self.pending_files.extend(
            files
                .iter()
                .filter(|name| !name.starts_with('.') && !is_thumbnail(name))
                .map(|name| join(&[dir, name.as_str()])),
        );

        // Reversed so the first subdirectory is walked first.
        self.pending_dirs.extend(
            directories
                .iter()
                .rev()
                .filter(|name| !name.starts_with('.'))
                .map(|name| join(&[dir, name.as_str()])),
        );
    }
}

impl Iterator for ImageFiles {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(file) = self.pending_files.pop_front() {
                return Some(file);
            }
            let dir = self.pending_dirs.pop()?;
            self.expand(&dir);
        }
    }
}
