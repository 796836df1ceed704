use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::{ImageBackend, ImageBackendError, NotAnImage};
use crate::media::{is_image, thumb_filename};
use crate::storage::Storage;
use crate::uploader::UploadedFile;

/// Thumbnails raster images with the `image` crate.
#[derive(Debug, Clone)]
pub struct RasterBackend {
    thumbnail_size: (u32, u32),
}

impl RasterBackend {
    pub fn new(thumbnail_size: (u32, u32)) -> Self {
        Self { thumbnail_size }
    }

    fn output_format(path: &str, data: &[u8]) -> Result<ImageFormat, ImageBackendError> {
        match ImageFormat::from_path(path) {
            Ok(format) => Ok(format),
            Err(_) => Ok(image::guess_format(data)?),
        }
    }

    fn render(&self, data: &[u8], format: ImageFormat) -> Result<Vec<u8>, ImageBackendError> {
        let (width, height) = self.thumbnail_size;
        let mut thumbnail = image::load_from_memory(data)?.thumbnail(width, height);

        // JPEG has no alpha channel.
        if format == ImageFormat::Jpeg {
            thumbnail = DynamicImage::ImageRgb8(thumbnail.to_rgb8());
        }

        let mut buf = Cursor::new(Vec::new());
        thumbnail.write_to(&mut buf, format)?;
        Ok(buf.into_inner())
    }
}

impl ImageBackend for RasterBackend {
    fn verify(&self, file: &UploadedFile) -> Result<(), NotAnImage> {
        image::guess_format(&file.content)
            .map(|_| ())
            .map_err(|_| NotAnImage {
                filename: file.name.clone(),
            })
    }

    fn should_create_thumbnail(&self, storage: &dyn Storage, path: &str) -> bool {
        if !is_image(path) {
            return false;
        }
        // An unrelated upload already owns the thumbnail name.
        match storage.exists(&thumb_filename(path)) {
            Ok(false) => {}
            Ok(true) => {
                debug!(path = %path, "thumbnail name taken, skipping");
                return false;
            }
            Err(err) => {
                debug!(path = %path, error = %err, "cannot check thumbnail name");
                return false;
            }
        }
        match storage.open(path) {
            Ok(data) => image::guess_format(&data).is_ok(),
            Err(err) => {
                debug!(path = %path, error = %err, "cannot read upload for thumbnailing");
                false
            }
        }
    }

    fn create_thumbnail(&self, storage: &dyn Storage, path: &str) -> Result<String, ImageBackendError> {
        let data = storage.open(path)?;
        let format = Self::output_format(path, &data)?;
        let rendered = self.render(&data, format)?;

        let saved = storage.save(&thumb_filename(path), &rendered)?;
        debug!(
            source = %path,
            thumbnail = %saved,
            size = rendered.len(),
            "thumbnail created"
        );
        Ok(saved)
    }

    fn name(&self) -> &'static str {
        "raster"
    }
}
