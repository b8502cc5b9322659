//! Image upload: multipart `file` field written to the upload directory and
//! served back under `/uploads`.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::AuthUser;

pub const UPLOAD_ROUTE_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif"];

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(e.body_text())
}

/// Extension for the stored file: taken from the client file name when it is
/// a known raster type, otherwise from the content type.
pub fn file_extension(file_name: Option<&str>, content_type: &str) -> Option<String> {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    if from_name.is_some() {
        return from_name;
    }
    let ext = match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        _ => return None,
    };
    Some(ext.to_string())
}

/// POST /api/upload
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let max_bytes = state.uploads.max_bytes;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(
                "Only image uploads are allowed".to_string(),
            ));
        }
        let ext = file_extension(field.file_name(), &content_type)
            .ok_or_else(|| AppError::Validation("Unsupported image type".to_string()))?;

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::Validation(format!(
                    "File size too large. Maximum {} bytes allowed.",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("No file provided".to_string()));
        }

        let name = format!("{}.{}", Uuid::new_v4().simple(), ext);
        tokio::fs::create_dir_all(&state.uploads.dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("create upload dir: {}", e)))?;
        tokio::fs::write(state.uploads.dir.join(&name), &bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("write upload: {}", e)))?;

        info!(%user_id, file = %name, size = bytes.len(), "image uploaded");
        return Ok(Json(json!({ "url": format!("{}/{}", UPLOAD_ROUTE_PREFIX, name) })));
    }

    Err(AppError::Validation("No file provided".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_file_name() {
        assert_eq!(file_extension(Some("Cover.PNG"), "image/png").as_deref(), Some("png"));
        assert_eq!(file_extension(Some("a.b.jpeg"), "image/jpeg").as_deref(), Some("jpeg"));
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(file_extension(Some("photo"), "image/webp").as_deref(), Some("webp"));
        assert_eq!(file_extension(Some("x.exe"), "image/jpeg").as_deref(), Some("jpg"));
        assert_eq!(file_extension(None, "image/gif").as_deref(), Some("gif"));
    }

    #[test]
    fn svg_and_unknown_types_are_refused() {
        assert_eq!(file_extension(Some("logo.svg"), "image/svg+xml"), None);
        assert_eq!(file_extension(None, "image/x-unknown"), None);
    }
}
