use axum::{
    extract::{rejection::FormRejection, Extension, Form, State},
    response::Html,
};
use tracing::debug;

use crate::{
    browser::{browse_entries, view, BrowsePage, FileLister, SearchForm},
    error::{AppError, Result},
    middleware::remote_user::AuthUser,
    AppState,
};

pub async fn browse_page(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
) -> Result<Html<String>> {
    render_browse(state, auth_user.map(|Extension(user)| user), None).await
}

pub async fn browse_search(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    form: std::result::Result<Form<SearchForm>, FormRejection>,
) -> Result<Html<String>> {
    // An unparseable body is an invalid form: rendered, never filtered.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!(error = %rejection, "unreadable search form");
            SearchForm::default()
        }
    };

    render_browse(state, auth_user.map(|Extension(user)| user), Some(form)).await
}

async fn render_browse(
    state: AppState,
    user: Option<AuthUser>,
    submitted: Option<SearchForm>,
) -> Result<Html<String>> {
    let uploader = &state.config.uploader;
    let lister = FileLister::new(state.storage.clone(), uploader, user.as_ref());
    let urls = state.urls.clone();
    let has_image_backend = uploader.has_image_backend();

    let files = tokio::task::spawn_blocking(move || browse_entries(lister.files(), &urls, has_image_backend))
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!("listing task failed: {}", e)))?;

    debug!(
        user = user.as_ref().map(|u| u.username.as_str()),
        count = files.len(),
        "listed uploads"
    );

    let page = BrowsePage::build(files, submitted, uploader.browse_show_dirs);
    let html = view::render(&state.templates, &page)?;
    Ok(Html(html))
}
