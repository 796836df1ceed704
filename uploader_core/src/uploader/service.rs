use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use super::path::upload_filename;
use super::UploadedFile;
use crate::config::UploaderConfig;
use crate::error::Result;
use crate::imaging::{ImageBackend, NotAnImage};
use crate::media::MediaUrls;
use crate::middleware::remote_user::AuthUser;
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub saved_path: String,
    pub thumbnail: Option<String>,
    pub url: String,
}

/// Verifies, stores and optionally thumbnails editor uploads.
#[derive(Clone)]
pub struct UploadService {
    config: Arc<UploaderConfig>,
    storage: Arc<dyn Storage>,
    backend: Arc<dyn ImageBackend>,
    urls: MediaUrls,
}

impl UploadService {
    pub fn new(
        config: Arc<UploaderConfig>,
        storage: Arc<dyn Storage>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        let urls = MediaUrls::from_config(&config);
        Self {
            config,
            storage,
            backend,
            urls,
        }
    }

    pub fn upload(&self, file: &UploadedFile, user: Option<&AuthUser>) -> Result<UploadOutcome> {
        self.upload_on(file, user, Local::now().date_naive())
    }

    /// Same as [`upload`](Self::upload) with the date directory fixed.
    pub fn upload_on(
        &self,
        file: &UploadedFile,
        user: Option<&AuthUser>,
        date: NaiveDate,
    ) -> Result<UploadOutcome> {
        self.verify(file);

        let requested = upload_filename(&self.config, self.storage.as_ref(), &file.name, user, date)?;
        let saved_path = self.storage.save(&requested, &file.content)?;

        let thumbnail = if self.backend.should_create_thumbnail(self.storage.as_ref(), &saved_path) {
            Some(self.backend.create_thumbnail(self.storage.as_ref(), &saved_path)?)
        } else {
            None
        };

        let url = self.urls.url(&saved_path);

        info!(
            original = %file.name,
            saved_path = %saved_path,
            size = file.size(),
            user = user.map(|u| u.username.as_str()),
            thumbnail = thumbnail.is_some(),
            "upload stored"
        );

        Ok(UploadOutcome {
            saved_path,
            thumbnail,
            url,
        })
    }

    fn verify(&self, file: &UploadedFile) {
        if let Err(err) = self.backend.verify(file) {
            self.on_verification_failure(err);
        }
    }

    /// Files that fail verification are still stored.
    fn on_verification_failure(&self, err: NotAnImage) {
        warn!(
            filename = %err.filename,
            backend = self.backend.name(),
            "upload failed image verification, storing anyway"
        );
    }
}

/// HTML fragment that hands the stored file's URL back to the editor.
pub fn callback_script(func_num: u32, url: &str) -> String {
    format!(
        "\n<script type='text/javascript'>\n    window.parent.CKEDITOR.tools.callFunction({}, '{}');\n</script>",
        func_num, url
    )
}
