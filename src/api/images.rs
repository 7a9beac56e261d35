//! Image endpoints
//!
//! Multipart upload in, raw bytes out.

use axum::{
    extract::{Json, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::roles;
use crate::error::AppError;
use crate::service::ImageService;

use super::dto::ImageUploadResponse;

fn image_service(state: &AppState) -> ImageService {
    ImageService::new(state.storage.clone())
}

/// POST /api/images
///
/// Expects one multipart field named `file`.
pub async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>), AppError> {
    user.require_role(roles::AUTHOR)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("failed to read upload: {e}")))?
            .to_vec();
        upload = Some((data, content_type, original_name));
        break;
    }

    let (data, content_type, original_name) =
        upload.ok_or_else(|| AppError::validation("multipart field 'file' is required"))?;

    let file_name = image_service(&state)
        .upload(data, &content_type, &original_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse { file_name }),
    ))
}

/// GET /api/images/:file_name
pub async fn download(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let file = image_service(&state).download(&file_name).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file.name),
            ),
        ],
        file.data,
    )
        .into_response())
}
