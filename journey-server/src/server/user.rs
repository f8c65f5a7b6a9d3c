use std::path::Path;

use axum::Json;
use axum::extract::{Extension, Multipart, State};
use journey_shared::api::{ApiResponse, AvatarResp, ProfileUpdateReq, UserDto};
use journey_shared::validate::validate_age;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::AuthCtx;
use super::{ApiResult, AppError, AppState, JsonBody, non_blank, ok};
use crate::storage::models::{User, UserPatch};
use crate::storage::rfc3339;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
const AVATAR_FIELD: &str = "avatar";
const UPLOADS_PREFIX: &str = "/uploads/";

pub(super) fn user_dto(u: User) -> UserDto {
    UserDto {
        user_id: u.id,
        role: u.role.parse().unwrap_or_default(),
        name: u.name,
        email: u.email,
        age: u.age,
        total_points: u.total_points,
        profile_image: u.profile_image,
        created_at: rfc3339(u.created_at),
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    JsonBody(body): JsonBody<ProfileUpdateReq>,
) -> ApiResult<UserDto> {
    if let Some(age) = body.age {
        validate_age(age)?;
    }
    let patch = UserPatch {
        name: non_blank(body.name),
        age: body.age,
        updated_at: None,
    };
    let user = state.store.update_user(auth.user_id, patch).await?;
    info!(user_id = user.id, "profile updated");
    ok(user_dto(user), "Profile updated successfully")
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    session: Session,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.store.delete_user(auth.user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    session.flush().await?;
    if let Some(old) = auth.profile_image.as_deref() {
        remove_upload(&state.config.upload_dir, old).await;
    }
    Ok(Json(ApiResponse::message("Account deleted successfully")))
}

/// Extension for the raster formats we accept as avatars. Anything else,
/// SVG included, is refused.
fn image_extension(content_type: &str) -> Option<&'static str> {
    let ct = content_type.trim().to_ascii_lowercase();
    let essence = ct.split(';').next().unwrap_or_default().trim();
    match essence {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

async fn remove_upload(upload_dir: &str, public_path: &str) {
    let Some(name) = public_path.strip_prefix(UPLOADS_PREFIX) else {
        return;
    };
    // Only files we named ourselves
    if name.contains('/') || name.contains("..") {
        return;
    }
    let path = Path::new(upload_dir).join(name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %e, "avatar: failed to remove old file");
    }
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    mut multipart: Multipart,
) -> ApiResult<AvatarResp> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let Some(ext) = field.content_type().and_then(image_extension) else {
            return Err(AppError::bad_request("Only image files are allowed"));
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        upload = Some((ext, data));
        break;
    }
    let Some((ext, data)) = upload else {
        return Err(AppError::bad_request("No file uploaded"));
    };
    if data.is_empty() {
        return Err(AppError::bad_request("No file uploaded"));
    }
    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::bad_request("File size must be 5MB or smaller"));
    }

    let file_name = format!("avatar-{}-{}.{ext}", auth.user_id, Uuid::new_v4());
    let dir = Path::new(&state.config.upload_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(AppError::internal)?;
    tokio::fs::write(dir.join(&file_name), &data)
        .await
        .map_err(AppError::internal)?;

    let public = format!("{UPLOADS_PREFIX}{file_name}");
    let previous = match state.store.set_profile_image(auth.user_id, &public).await {
        Ok(previous) => previous,
        Err(e) => {
            // Nothing points at the new file yet
            remove_upload(&state.config.upload_dir, &public).await;
            return Err(e.into());
        }
    };
    if let Some(old) = previous.as_deref() {
        remove_upload(&state.config.upload_dir, old).await;
    }
    info!(user_id = auth.user_id, bytes = data.len(), "avatar uploaded");
    ok(
        AvatarResp {
            profile_image: public,
        },
        "Profile image updated successfully",
    )
}
