use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::{error::AppError, middleware::auth::staff_auth_middleware, state::AppState};

pub fn routes(state: AppState) -> Router<AppState> {
    // Allow some multipart framing headroom above the image size cap
    let body_limit = state.uploads.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/v1/products/image", post(upload_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            staff_auth_middleware,
        ))
}

/// POST /v1/products/image
/// Multipart image upload. The file lands in the uploads directory and
/// the returned path is what a product's image_path should be set to.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationError(
                "Uploaded file must be an image".to_string(),
            ));
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?;

        if data.len() > state.uploads.max_upload_bytes {
            return Err(AppError::ValidationError(format!(
                "Image exceeds maximum size of {} bytes",
                state.uploads.max_upload_bytes
            )));
        }

        let filename = format!("{}_{}", Utc::now().timestamp(), sanitize_filename(&original_name));
        let dir = std::path::Path::new(&state.uploads.dir).join("products");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Failed to create upload dir: {}", e)))?;
        tokio::fs::write(dir.join(&filename), &data)
            .await
            .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Failed to store upload: {}", e)))?;

        let image_path = format!("storage/products/{}", filename);
        tracing::info!(filename = %filename, bytes = data.len(), "Image uploaded");

        return Ok(Json(json!({ "image_path": image_path })));
    }

    Err(AppError::ValidationError(
        "No image file provided".to_string(),
    ))
}

/// Strip anything path-like out of a client-supplied filename
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(['.', '_']);
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
