use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use validator::Validate;

use super::entries::BrowseEntry;

pub const BROWSE_TEMPLATE: &str = "ckeditor/browse.html";

/// Files the storage creates on its own on Windows hosts.
const RESERVED_NAME: &str = "Thumbs.db";

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct SearchForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Enter a search term of at most 255 characters"))]
    pub q: String,
}

/// Search form as rendered back to the page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchFormState {
    pub q: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage {
    pub show_dirs: bool,
    pub dirs: Vec<String>,
    pub files: Vec<BrowseEntry>,
    pub form: SearchFormState,
}

impl BrowsePage {
    /// `submitted` is `None` for a plain GET.
    pub fn build(files: Vec<BrowseEntry>, submitted: Option<SearchForm>, show_dirs: bool) -> Self {
        let (files, form) = match submitted {
            None => (files, SearchFormState::default()),
            Some(form) => match form.validate() {
                Ok(()) => (filter_by_name(files, &form.q), SearchFormState { q: form.q, errors: Vec::new() }),
                Err(errors) => (
                    files,
                    SearchFormState {
                        q: form.q,
                        errors: error_messages(&errors),
                    },
                ),
            },
        };

        let dirs = distinct_dirs(&files);
        let files = exclude_reserved(files, cfg!(windows));

        Self {
            show_dirs,
            dirs,
            files,
            form,
        }
    }
}

pub fn filter_by_name(files: Vec<BrowseEntry>, query: &str) -> Vec<BrowseEntry> {
    let needle = query.to_lowercase();
    files
        .into_iter()
        .filter(|entry| entry.display_name().to_lowercase().contains(&needle))
        .collect()
}

/// Parent URLs of the entries, deduplicated, in descending order.
pub fn distinct_dirs(files: &[BrowseEntry]) -> Vec<String> {
    files
        .iter()
        .map(|entry| match entry.src.rfind('/') {
            Some(idx) => entry.src[..idx].to_string(),
            None => String::new(),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

fn exclude_reserved(files: Vec<BrowseEntry>, enabled: bool) -> Vec<BrowseEntry> {
    if !enabled {
        return files;
    }
    files
        .into_iter()
        .filter(|entry| entry.src.rsplit('/').next() != Some(RESERVED_NAME))
        .collect()
}

fn error_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .map(|err| {
            err.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string())
        })
        .collect()
}

pub fn templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template(BROWSE_TEMPLATE, include_str!("../../templates/browse.html"))?;
    Ok(tera)
}

pub fn render(tera: &Tera, page: &BrowsePage) -> tera::Result<String> {
    let context = Context::from_serialize(page)?;
    tera.render(BROWSE_TEMPLATE, &context)
}
