//! Image processing backends used by the upload flow.

pub mod raster;

pub use raster::RasterBackend;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ImageBackendKind, UploaderConfig};
use crate::storage::{Storage, StorageError};
use crate::uploader::UploadedFile;

#[derive(Error, Debug)]
#[error("{filename} is not a recognised image")]
pub struct NotAnImage {
    pub filename: String,
}

#[derive(Error, Debug)]
pub enum ImageBackendError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

pub trait ImageBackend: Send + Sync {
    fn verify(&self, file: &UploadedFile) -> Result<(), NotAnImage>;

    fn should_create_thumbnail(&self, storage: &dyn Storage, path: &str) -> bool;

    /// Writes a thumbnail next to `path` and returns its storage name.
    fn create_thumbnail(&self, storage: &dyn Storage, path: &str) -> Result<String, ImageBackendError>;

    fn name(&self) -> &'static str;
}

/// Backend used when no image processing is configured: accepts every file
/// and never produces thumbnails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyBackend;

impl ImageBackend for DummyBackend {
    fn verify(&self, _file: &UploadedFile) -> Result<(), NotAnImage> {
        Ok(())
    }

    fn should_create_thumbnail(&self, _storage: &dyn Storage, _path: &str) -> bool {
        false
    }

    fn create_thumbnail(&self, _storage: &dyn Storage, path: &str) -> Result<String, ImageBackendError> {
        Ok(path.to_string())
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}

pub fn backend_for(config: &UploaderConfig) -> Arc<dyn ImageBackend> {
    match config.image_backend {
        Some(ImageBackendKind::Raster) => Arc::new(RasterBackend::new(config.thumbnail_size)),
        None => Arc::new(DummyBackend),
    }
}
