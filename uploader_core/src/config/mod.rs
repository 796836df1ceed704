pub mod settings;

pub use settings::{AppConfig, AuthConfig, ImageBackendKind, LoggingConfig, ServerConfig, UploaderConfig};
