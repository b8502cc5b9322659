//! Comment payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::CommentRow;
use crate::models::post::AuthorSummary;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author: AuthorSummary,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentResponse {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            author: AuthorSummary {
                id: row.author_id,
                username: row.author_username,
                avatar: row.author_avatar,
            },
            created_at: row.created_at,
        }
    }
}
