use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::UploaderConfig;
use crate::middleware::remote_user::AuthUser;
use crate::storage::{join, split_ext, Storage, StorageResult};

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9_\s-]").unwrap();
    static ref SLUG_SEPARATORS: Regex = Regex::new(r"[-\s]+").unwrap();
    static ref NON_EXT_CHARS: Regex = Regex::new(r"[^a-z0-9]").unwrap();
}

const EMPTY_SLUG: &str = "file";

/// Destination for an upload:
/// `<upload_path>/[<username>/]<YYYY/MM/DD>/<filename>`, disambiguated by the
/// storage so it never names an existing entry.
pub fn upload_filename(
    config: &UploaderConfig,
    storage: &dyn Storage,
    upload_name: &str,
    user: Option<&AuthUser>,
    date: NaiveDate,
) -> StorageResult<String> {
    let user_path = match user {
        Some(user) if config.restrict_by_user => user.username.as_str(),
        _ => "",
    };

    let date_path = date.format("%Y/%m/%d").to_string();

    let base_name = base_name(upload_name);
    let file_name = if config.slugify_filename {
        slugify_filename(base_name)
    } else if base_name.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        base_name.to_string()
    };

    let path = join(&[config.upload_path.as_str(), user_path, date_path.as_str(), file_name.as_str()]);
    storage.get_available_name(&path)
}

/// Drops any client-side directory components, `/` or `\` separated.
fn base_name(upload_name: &str) -> &str {
    upload_name
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(upload_name)
}

/// `My Photo.PNG` -> `my-photo.png`
pub fn slugify_filename(filename: &str) -> String {
    let (stem, ext) = split_ext(filename);

    let mut slug = slugify(stem);
    if slug.is_empty() {
        slug = EMPTY_SLUG.to_string();
    }

    let ext = NON_EXT_CHARS
        .replace_all(&ext.trim_start_matches('.').to_lowercase(), "")
        .into_owned();

    if ext.is_empty() {
        slug
    } else {
        format!("{}.{}", slug, ext)
    }
}

fn slugify(value: &str) -> String {
    // Decomposed first so accented letters keep their base letter.
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lowered, "");
    let collapsed = SLUG_SEPARATORS.replace_all(cleaned.trim(), "-");
    collapsed.trim_matches(|c: char| c == '-' || c == '_').to_string()
}
