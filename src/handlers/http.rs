//! Shared application state and the health probe.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::JwtSecret;
use crate::config::Config;
use crate::db::DbPool;
use crate::services::{Mailer, ResetTokenService};

#[derive(Clone, Debug)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// Shared application state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub jwt_secret: JwtSecret,
    pub reset_tokens: ResetTokenService,
    pub mailer: Arc<dyn Mailer>,
    /// Frontend base URL without trailing slash; reset links point here.
    pub app_url: String,
    pub uploads: UploadSettings,
}

impl AppState {
    pub fn from_config(config: &Config, db: DbPool, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            jwt_secret: JwtSecret::new(config.jwt_secret.clone()),
            reset_tokens: ResetTokenService::new(
                config.reset_token_secret.clone(),
                config.reset_token_ttl_minutes,
            ),
            mailer,
            app_url: config.app_url.clone(),
            uploads: UploadSettings {
                dir: config.upload_dir.clone(),
                max_bytes: config.max_upload_bytes,
            },
        }
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }
    pub fn jwt_secret(&self) -> &JwtSecret {
        &self.jwt_secret
    }
    pub fn reset_tokens(&self) -> &ResetTokenService {
        &self.reset_tokens
    }
    pub fn mailer(&self) -> Arc<dyn Mailer> {
        self.mailer.clone()
    }
}

/// GET /health: liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "inkwell" })),
    )
}
