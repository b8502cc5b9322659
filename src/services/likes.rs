//! Like toggle: flips the caller's membership in a post's likes.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::db::{like_add, like_count, like_remove, post_meta, DbPool};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub likes: i64,
    pub liked: bool,
}

/// Remove the like if present, add it otherwise, and report the new count.
/// The `(post_id, user_id)` key keeps a user in the likes at most once even
/// when two toggles race.
pub async fn toggle_like(pool: &DbPool, post_id: Uuid, user_id: Uuid) -> AppResult<LikeOutcome> {
    let meta = post_meta(pool, post_id)
        .await?
        .filter(|m| m.visible_to(Some(user_id)))
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let mut tx = pool.begin().await?;
    let removed = like_remove(&mut *tx, post_id, user_id).await?;
    if !removed {
        like_add(&mut *tx, post_id, user_id).await.map_err(|e| match e {
            AppError::Db(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                AppError::NotFound("Post not found".to_string())
            }
            other => other,
        })?;
    }
    let likes = like_count(&mut *tx, post_id).await?;
    tx.commit().await?;

    debug!(%post_id, %user_id, author_id = %meta.author_id, liked = !removed, likes, "like toggled");
    Ok(LikeOutcome {
        likes,
        liked: !removed,
    })
}
