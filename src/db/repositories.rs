//! Repositories: users, posts, likes, comments.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::DbPool;

fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Db(e),
    }
}

// ---- User ----

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn user_create(
    pool: &DbPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, password_hash, bio, avatar, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| map_unique_violation(e, "Username or email already registered"))
}

pub async fn user_find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, bio, avatar, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn user_find_by_username(pool: &DbPool, username: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, bio, avatar, created_at, updated_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn user_get_by_id(pool: &DbPool, id: Uuid) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, bio, avatar, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Profile fields to change. `None` leaves a field alone, `Some(None)` clears it.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub bio: Option<Option<String>>,
    pub avatar: Option<Option<String>>,
}

pub async fn user_update_profile(
    pool: &DbPool,
    id: Uuid,
    changes: ProfileChanges,
) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET bio = CASE WHEN $2 THEN $3 ELSE bio END,
            avatar = CASE WHEN $4 THEN $5 ELSE avatar END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, email, password_hash, bio, avatar, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(changes.bio.is_some())
    .bind(changes.bio.flatten())
    .bind(changes.avatar.is_some())
    .bind(changes.avatar.flatten())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn user_published_post_count(pool: &DbPool, user_id: Uuid) -> AppResult<i64> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*)::bigint FROM posts WHERE author_id = $1 AND published")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

// ---- Password reset ----

/// Store a reset token hash, replacing any earlier one for this user.
pub async fn user_set_reset_token(
    pool: &DbPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3 WHERE id = $1",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn user_find_by_reset_token(
    pool: &DbPool,
    token_hash: &str,
) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, bio, avatar, created_at, updated_at
        FROM users
        WHERE reset_token_hash = $1 AND reset_token_expires_at > NOW()
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Swap in the new password and consume the token. Returns false when the
/// token was already used or expired in the meantime.
pub async fn user_complete_password_reset(
    pool: &DbPool,
    user_id: Uuid,
    token_hash: &str,
    password_hash: &str,
) -> AppResult<bool> {
    let r = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $3,
            reset_token_hash = NULL,
            reset_token_expires_at = NULL,
            updated_at = NOW()
        WHERE id = $1 AND reset_token_hash = $2 AND reset_token_expires_at > NOW()
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(r.rows_affected() == 1)
}

// ---- Posts ----

#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub cover_image: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `$1` is the viewing user (nullable) for `liked_by_me`.
const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username AS author_username, u.avatar AS author_avatar,
           p.title, p.content, p.tags, p.published, p.cover_image,
           (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id)::bigint AS like_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)::bigint AS comment_count,
           EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $1::uuid) AS liked_by_me,
           p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub published: bool,
}

/// Post fields to change. `cover_image: Some(None)` removes the cover.
#[derive(Debug, Default, Clone)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<Option<String>>,
    pub published: Option<bool>,
}

#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    /// Already-escaped ILIKE pattern.
    pub pattern: Option<String>,
    pub tag: Option<String>,
    pub author_id: Option<Uuid>,
    pub include_unpublished: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct PostMeta {
    pub author_id: Uuid,
    pub published: bool,
}

impl PostMeta {
    /// Drafts are only visible to their author.
    pub fn visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.published || viewer == Some(self.author_id)
    }
}

pub async fn post_create(pool: &DbPool, author_id: Uuid, post: &NewPost) -> AppResult<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO posts (author_id, title, content, tags, cover_image, published)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.tags)
    .bind(&post.cover_image)
    .bind(post.published)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn post_get(pool: &DbPool, id: Uuid, viewer: Option<Uuid>) -> AppResult<Option<PostRow>> {
    let sql = format!("{} WHERE p.id = $2", POST_SELECT);
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn post_meta(pool: &DbPool, id: Uuid) -> AppResult<Option<PostMeta>> {
    let row = sqlx::query_as::<_, PostMeta>("SELECT author_id, published FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn posts_list(
    pool: &DbPool,
    filter: &PostFilter,
    viewer: Option<Uuid>,
) -> AppResult<Vec<PostRow>> {
    let sql = format!(
        r#"{}
        WHERE ($2::text IS NULL OR p.title ILIKE $2 OR p.content ILIKE $2)
          AND ($3::text IS NULL OR $3 = ANY(p.tags))
          AND ($4::uuid IS NULL OR p.author_id = $4)
          AND (p.published OR $5)
        ORDER BY p.created_at DESC
        LIMIT $6 OFFSET $7
        "#,
        POST_SELECT
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(&filter.pattern)
        .bind(&filter.tag)
        .bind(filter.author_id)
        .bind(filter.include_unpublished)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn post_update(pool: &DbPool, id: Uuid, changes: &PostChanges) -> AppResult<()> {
    let r = sqlx::query(
        r#"
        UPDATE posts
        SET title = COALESCE($2, title),
            content = COALESCE($3, content),
            tags = COALESCE($4::text[], tags),
            cover_image = CASE WHEN $5 THEN $6 ELSE cover_image END,
            published = COALESCE($7, published),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&changes.title)
    .bind(&changes.content)
    .bind(&changes.tags)
    .bind(changes.cover_image.is_some())
    .bind(changes.cover_image.clone().flatten())
    .bind(changes.published)
    .execute(pool)
    .await?;
    if r.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    Ok(())
}

/// Likes and comments go with the post via `ON DELETE CASCADE`.
pub async fn post_delete(pool: &DbPool, id: Uuid) -> AppResult<()> {
    let r = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if r.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    Ok(())
}

pub async fn tags_popular(pool: &DbPool, limit: i64) -> AppResult<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT t.tag, COUNT(*)::bigint
        FROM posts p
        CROSS JOIN LATERAL unnest(p.tags) AS t(tag)
        WHERE p.published
        GROUP BY t.tag
        ORDER BY COUNT(*) DESC, t.tag ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---- Likes ----

/// Returns true when a like existed and was removed.
pub async fn like_remove(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let r = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(r.rows_affected() > 0)
}

pub async fn like_add(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO post_likes (post_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (post_id, user_id) DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn like_count(conn: &mut PgConnection, post_id: Uuid) -> AppResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*)::bigint FROM post_likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.0)
}

// ---- Comments ----

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub async fn comments_list_by_post(pool: &DbPool, post_id: Uuid) -> AppResult<Vec<CommentRow>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
               u.avatar AS author_avatar, c.content, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn comment_create(
    pool: &DbPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> AppResult<CommentRow> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        WITH c AS (
            INSERT INTO comments (post_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author_id, content, created_at
        )
        SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
               u.avatar AS author_avatar, c.content, c.created_at
        FROM c
        JOIN users u ON u.id = c.author_id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn comment_get(pool: &DbPool, id: Uuid) -> AppResult<Option<CommentRow>> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
               u.avatar AS author_avatar, c.content, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn comment_delete(pool: &DbPool, id: Uuid) -> AppResult<()> {
    let r = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if r.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    Ok(())
}
