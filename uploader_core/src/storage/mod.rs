//! Storage contract for uploaded files.
//!
//! Names are `/`-separated paths relative to the storage root. Listing is an
//! optional capability: backends that cannot enumerate their contents keep
//! the provided `listdir`, which reports [`StorageError::Unsupported`].

pub mod filesystem;
pub mod memory;

pub use filesystem::FileSystemStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage does not support {0}")]
    Unsupported(&'static str),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Directory listing: `(directories, files)`, names only.
pub type Listing = (Vec<String>, Vec<String>);

pub trait Storage: Send + Sync {
    /// Persists `content` and returns the name it was actually stored under.
    fn save(&self, name: &str, content: &[u8]) -> StorageResult<String>;

    fn open(&self, name: &str) -> StorageResult<Vec<u8>>;

    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Returns `name`, or a suffixed variant of it that is not taken yet.
    fn get_available_name(&self, name: &str) -> StorageResult<String> {
        let mut candidate = name.to_string();
        while self.exists(&candidate)? {
            candidate = with_random_suffix(name);
        }
        Ok(candidate)
    }

    fn listdir(&self, _path: &str) -> StorageResult<Listing> {
        Err(StorageError::Unsupported("listdir"))
    }
}

/// `dir/name.ext` -> `dir/name_a1b2c3d.ext`
pub fn with_random_suffix(name: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let (dir, file) = split_dir(name);
    let (stem, ext) = split_ext(file);
    format!("{}{}_{}{}", dir, stem, &token[..7], ext)
}

/// Joins path segments with `/`, ignoring empty ones and stray separators.
pub fn join(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits `a/b/c.txt` into `("a/b/", "c.txt")`.
pub fn split_dir(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(idx) => (&name[..=idx], &name[idx + 1..]),
        None => ("", name),
    }
}

/// Splits `photo.tar.gz` into `("photo.tar", ".gz")`. Leading dots belong to
/// the stem, so `.hidden` has no extension.
pub fn split_ext(file: &str) -> (&str, &str) {
    match file.rfind('.') {
        Some(idx) if file[..idx].chars().any(|c| c != '.') => (&file[..idx], &file[idx..]),
        _ => (file, ""),
    }
}
