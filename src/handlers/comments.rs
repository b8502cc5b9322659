//! Comment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::db::{comment_create, comment_delete, comment_get, comments_list_by_post};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::handlers::posts::visible_post;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::CommentResponse;
use crate::services::posts::normalize_comment;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// GET /api/posts/:id/comment
pub async fn list_comments(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    visible_post(&state, post_id, viewer).await?;
    let comments: Vec<CommentResponse> = comments_list_by_post(state.db(), post_id)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    Ok(Json(json!({ "comments": comments })))
}

/// POST /api/posts/:id/comment
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<Uuid>,
    WithRejection(Json(body), _): WithRejection<Json<CreateCommentRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let content = normalize_comment(body.content.as_deref().unwrap_or_default())?;
    visible_post(&state, post_id, Some(user_id)).await?;

    let comment = comment_create(state.db(), post_id, user_id, &content).await?;
    info!(comment_id = %comment.id, %post_id, author_id = %user_id, "comment created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "comment": CommentResponse::from(comment) })),
    ))
}

async fn remove_comment(
    state: &AppState,
    user_id: Uuid,
    comment_id: Uuid,
    expected_post: Option<Uuid>,
) -> AppResult<Json<Value>> {
    let comment = comment_get(state.db(), comment_id)
        .await?
        .filter(|c| expected_post.map_or(true, |p| p == c.post_id))
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != user_id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    comment_delete(state.db(), comment_id).await?;
    info!(%comment_id, post_id = %comment.post_id, %user_id, "comment deleted");
    Ok(Json(json!({ "message": "Comment deleted" })))
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    remove_comment(&state, user_id, comment_id, None).await
}

/// DELETE /api/posts/:id/comment/:comment_id
pub async fn delete_post_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    remove_comment(&state, user_id, comment_id, Some(post_id)).await
}
