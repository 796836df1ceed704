use serde::Serialize;

use crate::media::{is_image, thumb_filename, MediaUrls};
use crate::storage::split_dir;

const MAX_VISIBLE_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowseEntry {
    pub thumb: String,
    pub src: String,
    pub is_image: bool,
    /// Shown under the icon of non-image files.
    pub visible_filename: Option<String>,
    pub name: String,
}

impl BrowseEntry {
    pub fn from_path(path: &str, urls: &MediaUrls, has_image_backend: bool) -> Self {
        let src = urls.url(path);
        let name = split_dir(path).1.to_string();
        let is_image = is_image(&src);

        let (thumb, visible_filename) = if !has_image_backend {
            (src.clone(), None)
        } else if is_image {
            (urls.url(&thumb_filename(path)), None)
        } else {
            (urls.icon_url(path), Some(truncate_display_name(&name)))
        };

        Self {
            thumb,
            src,
            is_image,
            visible_filename,
            name,
        }
    }

    /// Text the browse search matches against.
    pub fn display_name(&self) -> &str {
        self.visible_filename.as_deref().unwrap_or(&self.name)
    }
}

pub fn browse_entries<I>(files: I, urls: &MediaUrls, has_image_backend: bool) -> Vec<BrowseEntry>
where
    I: IntoIterator<Item = String>,
{
    files
        .into_iter()
        .map(|path| BrowseEntry::from_path(&path, urls, has_image_backend))
        .collect()
}

pub fn truncate_display_name(name: &str) -> String {
    if name.chars().count() > MAX_VISIBLE_LEN {
        let head: String = name.chars().take(MAX_VISIBLE_LEN - 1).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}
