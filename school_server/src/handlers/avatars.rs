use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use school_core::{
    ids::StudentId,
    service::avatars::{AvatarContent, AvatarUpload, AvatarView},
};
use tracing::instrument;

use crate::error::{multipart_error, AppError};
use crate::state::AppState;

static FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Accepts a multipart form with the image in its `file` field.
#[instrument(skip(state, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
    mut multipart: Multipart,
) -> Result<Json<AvatarView>, AppError> {
    let mut upload: Option<AvatarUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let original_filename = field.file_name().unwrap_or_default().to_string();
        let media_type = field
            .content_type()
            .unwrap_or(FALLBACK_MEDIA_TYPE)
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        upload = Some(AvatarUpload {
            declared_size: bytes.len() as i64,
            bytes,
            original_filename,
            media_type,
        });
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let avatar = state.core.avatars.upload_avatar(student_id, upload).await?;
    Ok(Json(avatar.into()))
}

fn image_response(content: AvatarContent) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content.media_type)
        .header(header::CONTENT_LENGTH, content.data.len())
        .body(Body::from(content.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

pub async fn avatar_from_db(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, AppError> {
    let content = state.core.avatars.get_avatar_db_data(student_id).await?;
    image_response(content)
}

pub async fn avatar_from_file(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, AppError> {
    let content = state.core.avatars.get_avatar_file_data(student_id).await?;
    image_response(content)
}

pub async fn avatars_page(
    State(state): State<AppState>,
    Path(page): Path<i64>,
) -> Result<Json<Vec<AvatarView>>, AppError> {
    let avatars = state.core.avatars.list_avatars_by_page(page).await?;
    Ok(Json(avatars))
}

#[instrument(skip(state))]
pub async fn restore_avatar(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<AvatarView>, AppError> {
    let avatar = state.core.avatars.restore_avatar_file(student_id).await?;
    Ok(Json(avatar.into()))
}

#[instrument(skip(state))]
pub async fn delete_avatar(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<StatusCode, AppError> {
    state.core.avatars.delete_avatar(student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
