use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub uploader: UploaderConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Everything the upload and browse endpoints consult.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Upload root, relative to the storage root.
    pub upload_path: String,
    /// Directory backing the filesystem storage.
    pub storage_root: PathBuf,
    pub media_url: String,
    pub static_url: String,
    pub restrict_by_user: bool,
    pub slugify_filename: bool,
    pub image_backend: Option<ImageBackendKind>,
    pub browse_show_dirs: bool,
    pub thumbnail_size: (u32, u32),
    pub max_upload_size_mb: u64,
    pub serve_media: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackendKind {
    Raster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub user_header: String,
    pub superuser_header: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: bool,
    pub filter: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            upload_path: "uploads/".to_string(),
            storage_root: PathBuf::from("./media"),
            media_url: "/media/".to_string(),
            static_url: "/static/".to_string(),
            restrict_by_user: false,
            slugify_filename: true,
            image_backend: None,
            browse_show_dirs: false,
            thumbnail_size: (75, 75),
            max_upload_size_mb: 10,
            serve_media: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-remote-user".to_string(),
            superuser_header: "x-remote-superuser".to_string(),
        }
    }
}

impl UploaderConfig {
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize) * 1024 * 1024
    }

    pub fn has_image_backend(&self) -> bool {
        self.image_backend.is_some()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("uploader.toml").exists() {
            builder = builder.add_source(File::with_name("uploader"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.uploader.upload_path.trim_matches('/').is_empty() {
            return Err(ConfigError::Message(
                "Upload path cannot be empty".to_string(),
            ));
        }

        for (name, url) in [
            ("media_url", &self.uploader.media_url),
            ("static_url", &self.uploader.static_url),
        ] {
            if !url.starts_with('/') || !url.ends_with('/') {
                return Err(ConfigError::Message(format!(
                    "{} must start and end with '/', got {:?}",
                    name, url
                )));
            }
        }

        let (width, height) = self.uploader.thumbnail_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Message(
                "Thumbnail dimensions must be greater than 0".to_string(),
            ));
        }

        if self.uploader.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "Max upload size must be greater than 0".to_string(),
            ));
        }

        if self.auth.user_header.is_empty() {
            return Err(ConfigError::Message(
                "User header name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn create_directories(&self) -> Result<(), std::io::Error> {
        let upload_root = self
            .uploader
            .storage_root
            .join(self.uploader.upload_path.trim_matches('/'));
        std::fs::create_dir_all(upload_root)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
