/**
 * Blog Routes
 * CRUD API endpoints for blog posts, with optional image upload
 */
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use super::{parse_id, require_fields, resource, EntityResponse};
use crate::db::models::BlogPost;
use crate::error::AppError;
use crate::images::{sniff_image, StagedUpload};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// File part of a multipart blog request
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Blog fields as sent by the panel, either as `multipart/form-data` or JSON.
#[derive(Debug, Default)]
pub struct BlogForm {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `image` sent as text: an already hosted URL
    pub image_url: Option<String>,
    /// `image` sent as a file
    pub image_file: Option<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct BlogJson {
    title: Option<String>,
    content: Option<String>,
    image: Option<String>,
}

impl BlogForm {
    /// Fields to store, with the image still unresolved.
    fn post(&self) -> BlogPost {
        BlogPost {
            title: self.title.clone().unwrap_or_default(),
            content: self.content.clone().unwrap_or_default(),
            image: String::new(),
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = BlogForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match (name.as_str(), file_name) {
                ("image", Some(file_name)) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::InvalidUpload(e.body_text()))?;
                    // Browsers send an empty part when no file was picked
                    if !bytes.is_empty() {
                        form.image_file = Some(UploadedFile {
                            file_name: Some(file_name),
                            bytes,
                        });
                    }
                }
                ("image", None) => form.image_url = Some(text(field).await?),
                ("title", _) => form.title = Some(text(field).await?),
                ("content", _) => form.content = Some(text(field).await?),
                (other, _) => tracing::debug!(field = other, "ignoring unknown blog form field"),
            }
        }

        Ok(form)
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))
}

impl<S: Send + Sync> FromRequest<S> for BlogForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let Json(body) = Json::<BlogJson>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        Ok(BlogForm {
            title: body.title,
            content: body.content,
            image_url: body.image,
            image_file: None,
        })
    }
}

// ============================================================================
// Image Resolution
// ============================================================================

/// Picks the image URL for a post: an explicit URL first, then an uploaded
/// file pushed through the image host, otherwise empty.
async fn resolve_image(state: &AppState, form: BlogForm) -> Result<String, AppError> {
    if let Some(url) = form.image_url.filter(|url| !url.trim().is_empty()) {
        if form.image_file.is_some() {
            tracing::debug!("image URL given, uploaded file ignored");
        }
        return Ok(url);
    }

    let Some(file) = form.image_file else {
        return Ok(String::new());
    };

    let format =
        sniff_image(&file.bytes, state.uploads.max_bytes).map_err(AppError::InvalidUpload)?;
    let staged = StagedUpload::write(&state.uploads.staging_dir, &file.bytes, format)
        .await
        .map_err(|e| AppError::image_host("Error staging image", e))?;

    tracing::debug!(
        original = file.file_name.as_deref().unwrap_or("unknown"),
        size = staged.size(),
        "uploading blog image"
    );

    let uploaded = state.images.upload(&staged).await;
    staged.discard();
    uploaded.map_err(|e| AppError::image_host("Error uploading image", e))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/blog - create a post
pub async fn create_post(
    State(state): State<AppState>,
    form: BlogForm,
) -> Result<Json<EntityResponse<BlogPost>>, AppError> {
    let mut post = form.post();
    require_fields(&post)?;
    post.image = resolve_image(&state, form).await?;

    let doc = state
        .collection::<BlogPost>()
        .create(&post)
        .await
        .map_err(|e| AppError::store("Error creating blog", e))?;

    tracing::info!(id = %doc.id, has_image = !doc.fields.image.is_empty(), "blog post created");
    Ok(Json(EntityResponse::new("saved", doc)))
}

/// PUT /api/blog/{id} - overwrite a post; an absent image clears it
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<BlogForm, AppError>,
) -> Result<Json<EntityResponse<BlogPost>>, AppError> {
    let id = parse_id::<BlogPost>(&id)?;
    let collection = state.collection::<BlogPost>();

    let form = match form {
        Ok(form) => form,
        Err(invalid) => return Err(resource::missing_or(&collection, id, invalid).await),
    };
    let mut post = form.post();
    if let Err(invalid) = require_fields(&post) {
        return Err(resource::missing_or(&collection, id, invalid).await);
    }
    if collection
        .get(id)
        .await
        .map_err(|e| AppError::store("Error updating blog", e))?
        .is_none()
    {
        return Err(AppError::NotFound("blog"));
    }
    post.image = resolve_image(&state, form).await?;

    let doc = collection
        .update(id, &post)
        .await
        .map_err(|e| AppError::store("Error updating blog", e))?
        .ok_or(AppError::NotFound("blog"))?;

    tracing::info!(id = %doc.id, "blog post updated");
    Ok(Json(EntityResponse::new("updated", doc)))
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    // Room for the form fields and multipart framing around the file
    let body_limit = max_upload_bytes + 1024 * 1024;

    Router::new()
        .route(
            "/",
            get(resource::list::<BlogPost>).post(create_post),
        )
        .route(
            "/{id}",
            put(update_post).delete(resource::delete::<BlogPost>),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{tests::PNG_BYTES, ImageHost, ImageHostError};
    use crate::routes::test_support::send_json;
    use crate::state::tests::test_state;
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode};
    use serde_json::{json, Value};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "panel-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send_multipart(
        app: Router,
        method: &str,
        uri: &str,
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let req = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app(state: AppState) -> Router {
        let limit = state.uploads.max_bytes;
        Router::new()
            .nest("/api/blog", router(limit))
            .with_state(state)
    }

    fn dir_is_empty(path: &std::path::Path) -> bool {
        std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    /// Image host that counts calls and always fails
    #[derive(Default)]
    struct FailingHost {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageHost for FailingHost {
        async fn upload(&self, staged: &StagedUpload) -> Result<String, ImageHostError> {
            assert!(staged.path().exists());
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ImageHostError::Rejected {
                status: 503,
                message: "host down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_create_from_json_with_image_url() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, body) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/blog",
            Some(json!({
                "title": "Hello",
                "content": "First post",
                "image": "https://img.example.com/a.png"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "blog saved");
        assert_eq!(body["blog"]["image"], "https://img.example.com/a.png");

        let (_, list) = send_json::<Vec<Value>>(app(state), "GET", "/api/blog", None).await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_create_without_image_stores_empty_url() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send_multipart(
            app(test_state(dir.path())),
            "POST",
            "/api/blog",
            &[Part::Text("title", "Hello"), Part::Text("content", "Body")],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blog"]["image"], "");
    }

    #[tokio::test]
    async fn test_uploaded_file_is_hosted_and_staging_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, body) = send_multipart(
            app(state.clone()),
            "POST",
            "/api/blog",
            &[
                Part::Text("title", "With picture"),
                Part::Text("content", "Body"),
                Part::File("image", "cat.png", PNG_BYTES),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let url = body["blog"]["image"].as_str().unwrap();
        assert!(url.starts_with("/uploads/"));
        let filename = url.rsplit('/').next().unwrap();
        assert!(dir.path().join("uploads").join(filename).exists());
        assert!(dir_is_empty(&state.uploads.staging_dir));
    }

    #[tokio::test]
    async fn test_explicit_url_wins_over_uploaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, body) = send_multipart(
            app(state.clone()),
            "POST",
            "/api/blog",
            &[
                Part::Text("title", "Both"),
                Part::Text("content", "Body"),
                Part::Text("image", "https://img.example.com/kept.png"),
                Part::File("image", "ignored.png", PNG_BYTES),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blog"]["image"], "https://img.example.com/kept.png");
        assert!(dir_is_empty(&dir.path().join("uploads")));
        assert!(dir_is_empty(&state.uploads.staging_dir));
    }

    #[tokio::test]
    async fn test_failed_remote_upload_still_clears_staging() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        let host = Arc::new(FailingHost::default());
        state.images = host.clone();

        let (status, body) = send_multipart(
            app(state.clone()),
            "POST",
            "/api/blog",
            &[
                Part::Text("title", "Doomed"),
                Part::Text("content", "Body"),
                Part::File("image", "cat.png", PNG_BYTES),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error uploading image");
        assert!(body["error"].as_str().unwrap().contains("host down"));
        assert_eq!(host.calls.load(Ordering::SeqCst), 1);
        assert!(dir_is_empty(&state.uploads.staging_dir));

        let (_, list) = send_json::<Vec<Value>>(app(state), "GET", "/api/blog", None).await;
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_non_image_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send_multipart(
            app(test_state(dir.path())),
            "POST",
            "/api/blog",
            &[
                Part::Text("title", "Script"),
                Part::Text("content", "Body"),
                Part::File("image", "evil.png", b"#!/bin/sh\necho hi\n"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid image upload");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        state.uploads.max_bytes = 4;

        let (status, body) = send_multipart(
            app(state),
            "POST",
            "/api/blog",
            &[
                Part::Text("title", "Big"),
                Part::Text("content", "Body"),
                Part::File("image", "big.png", PNG_BYTES),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("too large"));
    }

    #[tokio::test]
    async fn test_missing_title_is_rejected_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        let host = Arc::new(FailingHost::default());
        state.images = host.clone();

        let (status, _) = send_multipart(
            app(state),
            "POST",
            "/api/blog",
            &[
                Part::Text("content", "Body"),
                Part::File("image", "cat.png", PNG_BYTES),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_passed_url_and_clears_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (_, created) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/blog",
            Some(json!({ "title": "A", "content": "B", "image": "https://img.example.com/a.png" })),
        )
        .await;
        let id = created["blog"]["_id"].as_str().unwrap().to_string();
        let uri = format!("/api/blog/{id}");

        let (status, kept) = send_multipart(
            app(state.clone()),
            "PUT",
            &uri,
            &[
                Part::Text("title", "A2"),
                Part::Text("content", "B2"),
                Part::Text("image", "https://img.example.com/a.png"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(kept["message"], "blog updated");
        assert_eq!(kept["blog"]["title"], "A2");
        assert_eq!(kept["blog"]["image"], "https://img.example.com/a.png");

        let (_, cleared) = send_multipart(
            app(state),
            "PUT",
            &uri,
            &[Part::Text("title", "A3"), Part::Text("content", "B3")],
        )
        .await;
        assert_eq!(cleared["blog"]["image"], "");
    }

    #[tokio::test]
    async fn test_update_missing_post_skips_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        let host = Arc::new(FailingHost::default());
        state.images = host.clone();

        let (status, body) = send_multipart(
            app(state),
            "PUT",
            &format!("/api/blog/{}", uuid::Uuid::new_v4()),
            &[
                Part::Text("title", "A"),
                Part::Text("content", "B"),
                Part::File("image", "cat.png", PNG_BYTES),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "blog not found");
        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }

    async fn send_raw_json(app: Router, uri: &str, raw: &'static str) -> (StatusCode, Value) {
        let req = axum::http::Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(raw))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_update_missing_post_with_malformed_body_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, body) = send_raw_json(
            app(state.clone()),
            &format!("/api/blog/{}", uuid::Uuid::new_v4()),
            "not json",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "blog not found");

        // The same body against an existing post is a validation error
        let (_, created) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/blog",
            Some(json!({ "title": "A", "content": "B" })),
        )
        .await;
        let id = created["blog"]["_id"].as_str().unwrap().to_string();
        let (status, body) = send_raw_json(app(state), &format!("/api/blog/{id}"), "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing or invalid fields");
    }

    #[tokio::test]
    async fn test_delete_post() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (_, created) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/blog",
            Some(json!({ "title": "A", "content": "B" })),
        )
        .await;
        let id = created["blog"]["_id"].as_str().unwrap().to_string();

        let (status, deleted) =
            send_json::<Value>(app(state.clone()), "DELETE", &format!("/api/blog/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["message"], "blog deleted");

        let (status, again) =
            send_json::<Value>(app(state), "DELETE", &format!("/api/blog/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(again["message"], "blog not found");
    }
}
