//! Public URLs and filename conventions for stored files.

use crate::config::UploaderConfig;
use crate::storage::{split_dir, split_ext};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

const ICON_EXTENSIONS: [&str; 10] = [
    "doc", "docx", "pdf", "ppt", "pptx", "swf", "txt", "xls", "xlsx", "zip",
];

const THUMB_SUFFIX: &str = "_thumb";

/// Maps storage names to public URLs.
#[derive(Debug, Clone)]
pub struct MediaUrls {
    media_url: String,
    static_url: String,
}

impl MediaUrls {
    pub fn new(media_url: impl Into<String>, static_url: impl Into<String>) -> Self {
        Self {
            media_url: media_url.into(),
            static_url: static_url.into(),
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(config.media_url.clone(), config.static_url.clone())
    }

    pub fn url(&self, path: &str) -> String {
        let encoded = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}{}", self.media_url, encoded)
    }

    /// Generic file-type icon for a non-image file.
    pub fn icon_url(&self, path: &str) -> String {
        let ext = extension(path).to_lowercase();
        let icon = if ICON_EXTENSIONS.contains(&ext.as_str()) {
            ext.as_str()
        } else {
            "file"
        };
        format!("{}ckeditor/file-icons/{}.png", self.static_url, icon)
    }
}

/// `dir/photo.png` -> `dir/photo_thumb.png`
pub fn thumb_filename(path: &str) -> String {
    let (dir, file) = split_dir(path);
    let (stem, ext) = split_ext(file);
    format!("{}{}{}{}", dir, stem, THUMB_SUFFIX, ext)
}

pub fn is_thumbnail(file_name: &str) -> bool {
    let (_, file) = split_dir(file_name);
    split_ext(file).0.ends_with(THUMB_SUFFIX)
}

/// Text after the last `.`, or the whole string when there is none.
fn extension(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

pub fn is_image(path: &str) -> bool {
    let ext = extension(path).to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}
