use axum::{
    extract::{Extension, Multipart, Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    middleware::remote_user::AuthUser,
    uploader::{callback_script, UploadedFile},
    AppState,
};

const UPLOAD_FIELD: &str = "upload";

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(rename = "CKEditorFuncNum")]
    pub func_num: u32,
}

pub async fn upload_file(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    let mut uploaded: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?
            .to_string();

        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        uploaded = Some(UploadedFile::new(filename, data.to_vec()));
        break;
    }

    let file = uploaded.ok_or_else(|| {
        AppError::BadRequest(format!("No '{}' file in request", UPLOAD_FIELD))
    })?;

    let user = auth_user.map(|Extension(user)| user);
    let service = state.uploads.clone();
    let outcome = tokio::task::spawn_blocking(move || service.upload(&file, user.as_ref()))
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!("upload task failed: {}", e)))??;

    Ok(Html(callback_script(query.func_num, &outcome.url)))
}
