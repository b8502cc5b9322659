//! Post handlers: listing, CRUD, tag cloud and the like toggle.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::db::{
    comments_list_by_post, post_create, post_delete, post_get, post_meta, post_update,
    posts_list, tags_popular, user_find_by_username, NewPost, PostChanges, PostFilter, PostMeta,
};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{CommentResponse, PostResponse, TagCount};
use crate::services::posts::{
    normalize_content, normalize_image_ref, normalize_tag_filter, normalize_tags,
    normalize_title, page_bounds, search_pattern,
};
use crate::services::{toggle_like, LikeOutcome};

const TAG_CLOUD_SIZE: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    /// Author username, or `me` for the caller's own posts (drafts included).
    pub author: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Blank removes the cover image.
    pub cover_image: Option<String>,
    pub published: Option<bool>,
}

pub(crate) async fn visible_post(
    state: &AppState,
    id: Uuid,
    viewer: Option<Uuid>,
) -> AppResult<PostMeta> {
    post_meta(state.db(), id)
        .await?
        .filter(|m| m.visible_to(viewer))
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

async fn owned_post(state: &AppState, id: Uuid, user_id: Uuid) -> AppResult<PostMeta> {
    let meta = visible_post(state, id, Some(user_id)).await?;
    if meta.author_id != user_id {
        return Err(AppError::Forbidden(
            "You can only modify your own posts".to_string(),
        ));
    }
    Ok(meta)
}

async fn load_post(state: &AppState, id: Uuid, viewer: Option<Uuid>) -> AppResult<PostResponse> {
    post_get(state.db(), id, viewer)
        .await?
        .map(PostResponse::from)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Value>, AppError> {
    let (author_id, own_posts) = match query.author.as_deref().map(str::trim) {
        None | Some("") => (None, false),
        Some("me") => (
            Some(viewer.ok_or_else(|| {
                AppError::Auth("Log in to list your own posts".to_string())
            })?),
            true,
        ),
        Some(username) => (
            Some(
                user_find_by_username(state.db(), username)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
                    .id,
            ),
            false,
        ),
    };
    let (limit, offset) = page_bounds(query.limit, query.offset);

    let filter = PostFilter {
        pattern: search_pattern(query.q.as_deref()),
        tag: normalize_tag_filter(query.tag.as_deref()),
        author_id,
        include_unpublished: own_posts,
        limit,
        offset,
    };
    let posts: Vec<PostResponse> = posts_list(state.db(), &filter, viewer)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();

    Ok(Json(json!({ "posts": posts })))
}

/// GET /api/posts/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let tags: Vec<TagCount> = tags_popular(state.db(), TAG_CLOUD_SIZE)
        .await?
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    Ok(Json(json!({ "tags": tags })))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<CreatePostRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let new_post = NewPost {
        title: normalize_title(body.title.as_deref().unwrap_or_default())?,
        content: normalize_content(body.content.as_deref().unwrap_or_default())?,
        tags: normalize_tags(&body.tags)?,
        cover_image: match body.cover_image.as_deref() {
            Some(raw) => normalize_image_ref(raw)?,
            None => None,
        },
        published: body.published.unwrap_or(true),
    };

    let id = post_create(state.db(), user_id, &new_post).await?;
    info!(post_id = %id, author_id = %user_id, published = new_post.published, "post created");
    let post = load_post(&state, id, Some(user_id)).await?;

    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    visible_post(&state, id, viewer).await?;
    let post = load_post(&state, id, viewer).await?;
    let comments: Vec<CommentResponse> = comments_list_by_post(state.db(), id)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    Ok(Json(json!({ "post": post, "comments": comments })))
}

/// PUT /api/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(body), _): WithRejection<Json<UpdatePostRequest>, AppError>,
) -> Result<Json<Value>, AppError> {
    owned_post(&state, id, user_id).await?;

    let changes = PostChanges {
        title: body.title.as_deref().map(normalize_title).transpose()?,
        content: body.content.as_deref().map(normalize_content).transpose()?,
        tags: body.tags.as_deref().map(normalize_tags).transpose()?,
        cover_image: body.cover_image.as_deref().map(normalize_image_ref).transpose()?,
        published: body.published,
    };
    post_update(state.db(), id, &changes).await?;
    info!(post_id = %id, author_id = %user_id, "post updated");

    let post = load_post(&state, id, Some(user_id)).await?;
    Ok(Json(json!({ "post": post })))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    owned_post(&state, id, user_id).await?;
    post_delete(state.db(), id).await?;
    info!(post_id = %id, author_id = %user_id, "post deleted");
    Ok(Json(json!({ "message": "Post deleted" })))
}

/// POST /api/posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeOutcome>, AppError> {
    let outcome = toggle_like(state.db(), id, user_id).await?;
    Ok(Json(outcome))
}
