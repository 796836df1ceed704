//! Upload and file-browser endpoints for the CKEditor rich-text widget.

pub mod browser;
pub mod config;
pub mod error;
pub mod handlers;
pub mod imaging;
pub mod media;
pub mod middleware;
pub mod storage;
pub mod uploader;

pub use browser::{BrowseEntry, BrowsePage, FileLister, SearchForm};
pub use config::{AppConfig, ImageBackendKind, UploaderConfig};
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use imaging::{backend_for, DummyBackend, ImageBackend, RasterBackend};
pub use media::MediaUrls;
pub use middleware::remote_user::AuthUser;
pub use storage::{FileSystemStorage, MemoryStorage, Storage, StorageError};
pub use uploader::{UploadService, UploadedFile};

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use std::{net::SocketAddr, sync::Arc};
use tera::Tera;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn Storage>,
    pub image_backend: Arc<dyn ImageBackend>,
    pub uploads: UploadService,
    pub urls: MediaUrls,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// State over an arbitrary storage, with the image backend named in the
    /// configuration.
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let image_backend = backend_for(&config.uploader);
        let templates = browser::view::templates()?;
        let uploads = UploadService::new(
            Arc::new(config.uploader.clone()),
            Arc::clone(&storage),
            Arc::clone(&image_backend),
        );

        Ok(Self {
            app_name: "CKEditor Uploader".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            urls: MediaUrls::from_config(&config.uploader),
            config: Arc::new(config),
            storage,
            image_backend,
            uploads,
            templates: Arc::new(templates),
        })
    }

    /// State over the filesystem storage rooted at `uploader.storage_root`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let storage = FileSystemStorage::new(config.uploader.storage_root.clone());
        Self::new(config, Arc::new(storage))
    }
}

pub fn create_app(state: AppState) -> Router {
    let uploader = &state.config.uploader;

    let mut router = Router::new().merge(create_routes());

    if uploader.serve_media {
        let mount = uploader.media_url.trim_end_matches('/');
        router = router.nest_service(mount, ServeDir::new(&uploader.storage_root));
    }

    router = router.layer(DefaultBodyLimit::max(uploader.max_upload_bytes()));

    router = router.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::remote_user::remote_user_middleware,
    ));

    router = router.layer(middleware::logging::logging_layer());

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
