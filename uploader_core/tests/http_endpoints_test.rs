use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uploader_core::{create_app, AppConfig, AppState, ImageBackendKind, MemoryStorage, Storage};

const BOUNDARY: &str = "----uploader-test-boundary";

fn multipart(field: &str, filename: &str, data: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

fn upload_request(uri: &str, field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart(field, filename, data))
        .unwrap()
}

fn search_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/browse")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("q={}", query)))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn today_path() -> String {
    chrono::Local::now().date_naive().format("%Y/%m/%d").to_string()
}

fn memory_app(config: AppConfig, storage: &MemoryStorage) -> Router {
    let state = AppState::new(config, Arc::new(storage.clone())).unwrap();
    create_app(state)
}

fn filesystem_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.uploader.storage_root = temp_dir.path().to_path_buf();
    let state = AppState::from_config(config).unwrap();
    (create_app(state), temp_dir)
}

fn seeded_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    for name in [
        "uploads/2024/01/01/cat.png",
        "uploads/2024/01/01/cat_thumb.png",
        "uploads/2024/01/01/dog.png",
        "uploads/2024/01/02/Concatenated Notes.txt",
        "uploads/alice/2024/01/03/alice-cat.gif",
        "uploads/.trash/old-cat.png",
    ] {
        storage.save(name, b"x").unwrap();
    }
    storage
}

#[tokio::test]
async fn test_upload_returns_callback_script() {
    let (app, temp_dir) = filesystem_app();

    let response = app
        .oneshot(upload_request("/upload?CKEditorFuncNum=7", "upload", "My Photo.PNG", b"fake png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let expected_path = format!("uploads/{}/my-photo.png", today_path());
    let body = body_text(response).await;
    assert!(
        body.contains(&format!(
            "window.parent.CKEDITOR.tools.callFunction(7, '/media/{}');",
            expected_path
        )),
        "unexpected body: {}",
        body
    );

    let stored = std::fs::read(temp_dir.path().join(&expected_path)).unwrap();
    assert_eq!(stored, b"fake png");
}

#[tokio::test]
async fn test_uploaded_file_is_served_from_media_url() {
    let (app, _temp_dir) = filesystem_app();

    let response = app
        .clone()
        .oneshot(upload_request("/upload?CKEditorFuncNum=1", "upload", "notes.txt", b"hello media"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/media/uploads/{}/notes.txt", today_path());
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "hello media");
}

#[tokio::test]
async fn test_upload_collision_gets_new_name() {
    let storage = MemoryStorage::new();
    let app = memory_app(AppConfig::default(), &storage);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(upload_request("/upload?CKEditorFuncNum=2", "upload", "cat.png", b"x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let names = storage.names();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
}

#[tokio::test]
async fn test_upload_rejects_other_methods() {
    let storage = MemoryStorage::new();
    let app = memory_app(AppConfig::default(), &storage);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/upload?CKEditorFuncNum=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_upload_without_file_field_is_bad_request() {
    let storage = MemoryStorage::new();
    let app = memory_app(AppConfig::default(), &storage);

    let response = app
        .oneshot(upload_request("/upload?CKEditorFuncNum=1", "attachment", "a.png", b"x"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_upload_without_callback_number_is_bad_request() {
    let storage = MemoryStorage::new();
    let app = memory_app(AppConfig::default(), &storage);

    for uri in ["/upload", "/upload?CKEditorFuncNum=abc"] {
        let response = app
            .clone()
            .oneshot(upload_request(uri, "upload", "a.png", b"x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_restricted_upload_uses_remote_user_directory() {
    let storage = MemoryStorage::new();
    let mut config = AppConfig::default();
    config.uploader.restrict_by_user = true;
    let app = memory_app(config, &storage);

    let mut request = upload_request("/upload?CKEditorFuncNum=3", "upload", "a.txt", b"x");
    request
        .headers_mut()
        .insert("x-remote-user", "alice".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let expected = format!("uploads/alice/{}/a.txt", today_path());
    assert!(storage.exists(&expected).unwrap(), "{:?}", storage.names());
}

#[tokio::test]
async fn test_upload_oversized_body_is_rejected() {
    let storage = MemoryStorage::new();
    let mut config = AppConfig::default();
    config.uploader.max_upload_size_mb = 1;
    let app = memory_app(config, &storage);

    let data = vec![b'a'; 2 * 1024 * 1024];
    let response = app
        .oneshot(upload_request("/upload?CKEditorFuncNum=1", "upload", "big.txt", &data))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_browse_lists_files_without_thumbnails_or_dotfiles() {
    let storage = seeded_storage();
    let app = memory_app(AppConfig::default(), &storage);

    let response = app
        .oneshot(Request::builder().uri("/browse").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("/media/uploads/2024/01/01/cat.png"));
    assert!(body.contains("/media/uploads/2024/01/01/dog.png"));
    assert!(body.contains("/media/uploads/alice/2024/01/03/alice-cat.gif"));
    assert!(!body.contains("cat_thumb.png"));
    assert!(!body.contains("old-cat.png"));
}

#[tokio::test]
async fn test_browse_search_filters_case_insensitively() {
    let storage = seeded_storage();
    let mut config = AppConfig::default();
    config.uploader.image_backend = Some(ImageBackendKind::Raster);
    let app = memory_app(config, &storage);

    let response = app.oneshot(search_request("CAT")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("/media/uploads/2024/01/01/cat.png"));
    assert!(body.contains("/media/uploads/2024/01/01/cat_thumb.png"));
    assert!(body.contains("Concatenated Notes..."));
    assert!(body.contains("/media/uploads/alice/2024/01/03/alice-cat.gif"));
    assert!(!body.contains("dog.png"));
}

#[tokio::test]
async fn test_browse_empty_search_is_unfiltered() {
    let storage = seeded_storage();
    let app = memory_app(AppConfig::default(), &storage);

    let response = app.oneshot(search_request("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("dog.png"));
    assert!(body.contains("class=\"errors\""));
}

#[tokio::test]
async fn test_browse_restricted_to_own_directory() {
    let storage = seeded_storage();
    let mut config = AppConfig::default();
    config.uploader.restrict_by_user = true;
    let app = memory_app(config, &storage);

    let request = Request::builder()
        .uri("/browse")
        .header("x-remote-user", "alice")
        .body(Body::empty())
        .unwrap();
    let body = body_text(app.clone().oneshot(request).await.unwrap()).await;
    assert!(body.contains("alice-cat.gif"));
    assert!(!body.contains("dog.png"));

    let request = Request::builder()
        .uri("/browse")
        .header("x-remote-user", "alice")
        .header("x-remote-superuser", "true")
        .body(Body::empty())
        .unwrap();
    let body = body_text(app.oneshot(request).await.unwrap()).await;
    assert!(body.contains("alice-cat.gif"));
    assert!(body.contains("dog.png"));
}

#[tokio::test]
async fn test_browse_shows_directories_when_enabled() {
    let storage = seeded_storage();
    let mut config = AppConfig::default();
    config.uploader.browse_show_dirs = true;
    let app = memory_app(config, &storage);

    let response = app
        .oneshot(Request::builder().uri("/browse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_text(response).await;

    let newest = body.find("data-dir=\"/media/uploads/alice/2024/01/03\"").unwrap();
    let oldest = body.find("data-dir=\"/media/uploads/2024/01/01\"").unwrap();
    assert!(newest < oldest);
}

#[tokio::test]
async fn test_health() {
    let storage = MemoryStorage::new();
    let app = memory_app(AppConfig::default(), &storage);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["image_backend"], "dummy");
}
