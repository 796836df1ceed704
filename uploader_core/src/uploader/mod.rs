//! Upload flow: destination naming and the verify/save/thumbnail pipeline.

pub mod path;
pub mod service;

pub use path::{slugify_filename, upload_filename};
pub use service::{callback_script, UploadOutcome, UploadService};

/// A file received from the editor, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}
