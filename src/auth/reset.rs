//! Password reset over email: request a link, check it, spend it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::auth::AuthAppService;
use crate::db::{
    user_complete_password_reset, user_find_by_email, user_find_by_reset_token,
    user_set_reset_token, UserRow,
};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::services::{email_templates, OutgoingEmail, ResetTokenService};

pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";
const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired reset token";

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordBody {
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAndPasswordBody {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Deliver in the background so response time does not depend on whether
/// the account exists.
fn send_in_background(state: &AppState, email: OutgoingEmail, user_id: uuid::Uuid) {
    let mailer = state.mailer();
    tokio::spawn(async move {
        let subject = email.subject.clone();
        if let Err(e) = mailer.send(email).await {
            error!(%user_id, %subject, error = %e, "failed to send account email");
        }
    });
}

/// POST /api/auth/password-reset-request
pub async fn request_password_reset(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<ResetRequestBody>, AppError>,
) -> Result<Json<Value>, AppError> {
    let email = AuthAppService::normalize_email(body.email.as_deref().unwrap_or_default());
    AuthAppService::validate_email(&email)?;

    let Some(user) = user_find_by_email(state.db(), &email).await? else {
        info!("password reset requested for unknown email");
        return Ok(Json(json!({ "message": RESET_REQUESTED_MESSAGE })));
    };

    let issued = state.reset_tokens().issue()?;
    user_set_reset_token(state.db(), user.id, &issued.token_hash, issued.expires_at).await?;

    let reset_url = format!("{}/reset-password/{}", state.app_url, issued.token);
    let html = email_templates::password_reset_request(
        &reset_url,
        &user.username,
        state.reset_tokens().ttl_minutes(),
    );
    send_in_background(
        &state,
        OutgoingEmail {
            to: user.email.clone(),
            subject: email_templates::RESET_REQUEST_SUBJECT.to_string(),
            html,
        },
        user.id,
    );
    info!(user_id = %user.id, expires_at = %issued.expires_at, "password reset requested");

    Ok(Json(json!({ "message": RESET_REQUESTED_MESSAGE })))
}

async fn find_by_token(state: &AppState, token: &str) -> AppResult<Option<(UserRow, String)>> {
    if !ResetTokenService::is_well_formed(token) {
        return Ok(None);
    }
    let token_hash = state.reset_tokens().hash(token)?;
    Ok(user_find_by_reset_token(state.db(), &token_hash)
        .await?
        .map(|user| (user, token_hash)))
}

/// GET /api/auth/password-reset/:token
pub async fn verify_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    match find_by_token(&state, token.trim()).await? {
        Some((user, _)) => Ok((
            StatusCode::OK,
            Json(json!({ "valid": true, "email": user.email })),
        )),
        None => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "error": INVALID_TOKEN_MESSAGE })),
        )),
    }
}

async fn complete_reset(
    state: &AppState,
    token: Option<String>,
    new_password: Option<String>,
) -> AppResult<Json<Value>> {
    let token = token.map(|t| t.trim().to_string()).unwrap_or_default();
    let new_password = new_password.unwrap_or_default();
    if token.is_empty() || new_password.is_empty() {
        return Err(AppError::Validation(
            "Token and new password are required".to_string(),
        ));
    }
    AuthAppService::validate_password(&new_password)?;

    let (user, token_hash) = find_by_token(state, &token)
        .await?
        .ok_or_else(|| AppError::Validation(INVALID_TOKEN_MESSAGE.to_string()))?;

    if AuthAppService::verify_password(&new_password, &user.password_hash)? {
        return Err(AppError::Validation(
            "New password cannot be the same as your current password".to_string(),
        ));
    }

    let password_hash = AuthAppService::hash_password(&new_password)?;
    if !user_complete_password_reset(state.db(), user.id, &token_hash, &password_hash).await? {
        return Err(AppError::Validation(INVALID_TOKEN_MESSAGE.to_string()));
    }
    info!(user_id = %user.id, "password reset completed");

    send_in_background(
        state,
        OutgoingEmail {
            to: user.email.clone(),
            subject: email_templates::RESET_SUCCESS_SUBJECT.to_string(),
            html: email_templates::password_reset_success(&user.username),
        },
        user.id,
    );

    Ok(Json(json!({ "message": "Password reset successful" })))
}

/// POST /api/auth/password-reset/:token
pub async fn reset_password_with_path_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<NewPasswordBody>, AppError>,
) -> Result<Json<Value>, AppError> {
    complete_reset(&state, Some(token), body.new_password).await
}

/// POST /api/auth/password_reset
pub async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<TokenAndPasswordBody>, AppError>,
) -> Result<Json<Value>, AppError> {
    complete_reset(&state, body.token, body.new_password).await
}
