//! Account and profile payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::UserRow;

/// The caller's own account, including email.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserInfo {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            bio: row.bio.unwrap_or_default(),
            avatar: row.avatar.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

/// What anyone can see about an author.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub post_count: i64,
}

impl PublicProfile {
    pub fn new(row: UserRow, post_count: i64) -> Self {
        Self {
            id: row.id,
            username: row.username,
            bio: row.bio.unwrap_or_default(),
            avatar: row.avatar.unwrap_or_default(),
            created_at: row.created_at,
            post_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}
