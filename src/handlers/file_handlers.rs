//! HTTP handlers for the file-manager endpoints.
//!
//! Handlers stay thin: decode the request, call `DriveService`, serialize
//! the result. Continuation cursors cross the HTTP boundary base64-wrapped
//! so clients treat them as fully opaque; they are decoded back to the
//! store's raw token on the way in.

use crate::{
    errors::{ApiError, ValidatedJson},
    models::file::FileSummary,
    services::drive_service::DriveService,
};
use axum::{
    Json,
    extract::{Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use super::auth::AdminGuard;

/// Query params accepted by `GET /files`.
#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub folder: Option<String>,
    pub limit: Option<usize>,
    #[serde(rename = "continuationToken")]
    pub continuation_token: Option<String>,
    /// Set to `false` to skip per-item URL generation (cheaper pages, but
    /// each item needs a follow-up call to `/files/download`).
    pub urls: Option<bool>,
}

/// Query params accepted by `GET /files/download`.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub key: String,
    /// Serve inline instead of forcing an attachment disposition.
    pub inline: Option<bool>,
    /// Answer with a 307 to the signed URL instead of a JSON body.
    pub redirect: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub key: String,
    #[serde(rename = "newName")]
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub key: String,
    #[serde(rename = "newFolder")]
    pub new_folder: String,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    #[serde(flatten)]
    file: FileSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    message: String,
    files: Vec<FileSummary>,
    /// Always present, `null` on the last page.
    next_continuation_token: Option<String>,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
    key: String,
}

#[derive(Serialize)]
struct DownloadResponse {
    message: String,
    key: String,
    url: String,
}

#[derive(Serialize)]
struct RelocateResponse {
    message: String,
    #[serde(flatten)]
    file: crate::models::file::RelocatedFile,
}

/// POST `/upload` — store a new object from a multipart form.
///
/// Expects the file under the `document` field, with an optional `folder`
/// text field.
pub async fn upload_document(
    State(service): State<DriveService>,
    _admin: AdminGuard,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut folder: Option<String> = None;
    let mut document: Option<(String, Option<String>, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                document = Some((file_name, content_type, data));
            }
            "folder" => {
                folder = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed to read folder field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        document.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let file = service
        .upload(folder.as_deref(), &file_name, content_type.as_deref(), data)
        .await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".into(),
        file,
    }))
}

/// GET `/files` — one page of files, optionally scoped to a folder.
pub async fn list_files(
    State(service): State<DriveService>,
    Query(query): Query<ListFilesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let cursor = query.continuation_token.as_deref().map(decode_cursor);
    let page = service
        .list(
            query.folder.as_deref(),
            query.limit,
            cursor.as_deref(),
            query.urls.unwrap_or(true),
        )
        .await?;

    Ok(Json(ListResponse {
        message: "OK".into(),
        files: page.files,
        next_continuation_token: page.next_cursor.as_deref().map(encode_cursor),
    }))
}

/// DELETE `/files` — remove one object by key.
pub async fn delete_file(
    State(service): State<DriveService>,
    _admin: AdminGuard,
    ValidatedJson(body): ValidatedJson<DeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    service.delete(&body.key).await?;
    Ok(Json(DeleteResponse {
        message: "File deleted".into(),
        key: body.key,
    }))
}

/// GET `/files/download` — issue a time-limited download URL.
pub async fn download_file(
    State(service): State<DriveService>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let url = service
        .download_url(&query.key, query.inline.unwrap_or(false))
        .await?;

    if query.redirect.unwrap_or(false) {
        return Ok(Redirect::temporary(&url).into_response());
    }

    Ok(Json(DownloadResponse {
        message: "OK".into(),
        key: query.key,
        url,
    })
    .into_response())
}

/// PUT `/files/rename` — rename within the current folder.
pub async fn rename_file(
    State(service): State<DriveService>,
    _admin: AdminGuard,
    ValidatedJson(body): ValidatedJson<RenameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let file = service.rename(&body.key, &body.new_name).await?;
    Ok(Json(RelocateResponse {
        message: "File renamed".into(),
        file,
    }))
}

/// PUT `/files/move` — relocate to another folder.
pub async fn move_file(
    State(service): State<DriveService>,
    _admin: AdminGuard,
    ValidatedJson(body): ValidatedJson<MoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let file = service.move_to_folder(&body.key, &body.new_folder).await?;
    Ok(Json(RelocateResponse {
        message: "File moved".into(),
        file,
    }))
}

fn encode_cursor(token: &str) -> String {
    general_purpose::STANDARD.encode(token)
}

/// Decode an incoming cursor, tolerating clients that echo the raw store
/// token back instead of the base64 wrapper.
fn decode_cursor(token: &str) -> String {
    general_purpose::STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::routes::routes::routes;
    use crate::storage::memory::MemoryStore;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "drive-test-boundary";

    fn test_config(admin_token: Option<&str>) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            bucket: "test-bucket".into(),
            region: "us-east-1".into(),
            endpoint_url: None,
            public_read: false,
            url_expiry_secs: 3600,
            max_upload_bytes: 1024,
            list_cache_ttl_secs: 0,
            admin_token: admin_token.map(str::to_string),
        }
    }

    fn app(admin_token: Option<&str>) -> (Arc<MemoryStore>, Router) {
        let store = Arc::new(MemoryStore::new());
        let service = DriveService::new(store.clone(), Arc::new(test_config(admin_token)));
        (store, routes().with_state(service))
    }

    fn multipart_upload(folder: Option<&str>, file_name: &str, data: &str) -> Request<Body> {
        let mut body = String::new();
        if let Some(folder) = folder {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n{folder}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n{data}\r\n--{BOUNDARY}--\r\n"
        ));
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_stores_and_reports_the_file() {
        let (store, app) = app(None);
        let response = app
            .oneshot(multipart_upload(Some("OS 101"), "My Notes.pdf", "pdfdata"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["key"], "uploads/os_101/my_notes.pdf");
        assert_eq!(body["folder"], "os_101");
        assert_eq!(body["name"], "my_notes.pdf");
        assert_eq!(body["size"], 7);
        assert!(body["url"].as_str().unwrap().starts_with("memory://"));
        assert!(store.contents("uploads/os_101/my_notes.pdf").is_some());
    }

    #[tokio::test]
    async fn upload_without_document_field_is_rejected() {
        let (_, app) = app(None);
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\nmisc\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "No file uploaded");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn listing_pages_with_opaque_tokens() {
        let (store, app) = app(None);
        store.insert("uploads/os_101/a.pdf", b"a", "application/pdf");
        store.insert("uploads/os_101/b.pdf", b"b", "application/pdf");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/files?folder=os_101&limit=1&urls=false")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["files"].as_array().unwrap().len(), 1);
        let token = body["nextContinuationToken"].as_str().unwrap().to_string();
        // Wrapped token, not the raw store cursor.
        assert_ne!(token, "uploads/os_101/a.pdf");

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/files?folder=os_101&limit=1&urls=false&continuationToken={token}"
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        let files = body["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["name"], "b.pdf");
        assert!(body["nextContinuationToken"].is_null());
    }

    #[tokio::test]
    async fn delete_missing_key_is_a_404() {
        let (_, app) = app(None);
        let request = Request::builder()
            .method("DELETE")
            .uri("/files")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"key":"uploads/root/ghost.pdf"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["message"], "File not found");
    }

    #[tokio::test]
    async fn download_returns_a_url_or_redirects() {
        let (store, app) = app(None);
        store.insert("uploads/root/a.pdf", b"a", "application/pdf");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/files/download?key=uploads/root/a.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["url"].as_str().unwrap().contains("attachment"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/files/download?key=uploads/root/a.pdf&redirect=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert!(response.headers().contains_key(header::LOCATION));
    }

    #[tokio::test]
    async fn rename_round_trips_through_json() {
        let (store, app) = app(None);
        store.insert("uploads/os_101/my_notes.pdf", b"pdf", "application/pdf");

        let request = Request::builder()
            .method("PUT")
            .uri("/files/rename")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"key":"uploads/os_101/my_notes.pdf","newName":"lecture1"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["key"], "uploads/os_101/lecture1.pdf");
        assert_eq!(body["name"], "lecture1.pdf");
        assert_eq!(body["folder"], "os_101");
        assert!(store.contents("uploads/os_101/my_notes.pdf").is_none());
    }

    #[tokio::test]
    async fn move_changes_the_folder_segment() {
        let (store, app) = app(None);
        store.insert("uploads/os_101/lecture1.pdf", b"pdf", "application/pdf");

        let request = Request::builder()
            .method("PUT")
            .uri("/files/move")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"key":"uploads/os_101/lecture1.pdf","newFolder":"Semester 2"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["key"], "uploads/semester_2/lecture1.pdf");
        assert!(store.contents("uploads/semester_2/lecture1.pdf").is_some());
    }

    #[tokio::test]
    async fn malformed_json_bodies_get_structured_errors() {
        let (_, app) = app(None);
        let request = Request::builder()
            .method("PUT")
            .uri("/files/rename")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().contains("invalid request body"));
    }

    #[tokio::test]
    async fn writes_require_the_admin_token_when_configured() {
        let (store, app) = app(Some("sekrit"));
        store.insert("uploads/root/a.pdf", b"a", "application/pdf");

        // No token: rejected.
        let response = app
            .clone()
            .oneshot(multipart_upload(None, "x.pdf", "x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Reads stay open.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/files?urls=false")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Correct token: admitted.
        let mut request = multipart_upload(None, "x.pdf", "x");
        request.headers_mut().insert(
            crate::handlers::auth::ADMIN_TOKEN_HEADER,
            "sekrit".parse().unwrap(),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
