//! Profile handlers: the caller's own account and public author pages.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;

use crate::db::{
    user_find_by_username, user_get_by_id, user_published_post_count, user_update_profile,
    ProfileChanges,
};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::AuthUser;
use crate::models::{PublicProfile, UserInfo};
use crate::services::posts::{normalize_bio, normalize_image_ref};

/// Absent fields stay as they are; blank strings clear the field.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// GET /api/me
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserInfo>, AppError> {
    let user = user_get_by_id(state.db(), user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user.into()))
}

/// PUT /api/me, PUT /api/edit_profile
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> Result<Json<UserInfo>, AppError> {
    let changes = ProfileChanges {
        bio: body.bio.as_deref().map(normalize_bio).transpose()?,
        avatar: body.avatar.as_deref().map(normalize_image_ref).transpose()?,
    };
    let user = user_update_profile(state.db(), user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    info!(%user_id, "profile updated");
    Ok(Json(user.into()))
}

/// GET /api/users/:username
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>, AppError> {
    let user = user_find_by_username(state.db(), &username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let post_count = user_published_post_count(state.db(), user.id).await?;
    Ok(Json(PublicProfile::new(user, post_count)))
}
