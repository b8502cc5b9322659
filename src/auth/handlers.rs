//! Auth HTTP handlers: register, login.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::AuthAppService;
use crate::db::{user_create, user_find_by_email, user_find_by_username};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::AuthResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let username = body.username.trim();
    AuthAppService::validate_username(username)?;
    let email = AuthAppService::normalize_email(&body.email);
    AuthAppService::validate_email(&email)?;
    AuthAppService::validate_password(&body.password)?;

    if user_find_by_email(state.db(), &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if user_find_by_username(state.db(), username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = AuthAppService::hash_password(&body.password)?;
    let user = user_create(state.db(), username, &email, &password_hash).await?;
    let token = state.jwt_secret().issue(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = AuthAppService::normalize_email(&body.email);
    let invalid = || AppError::Auth("Invalid email or password".to_string());

    let user = match user_find_by_email(state.db(), &email).await? {
        Some(user) => user,
        None => {
            warn!("login attempt for unknown email");
            return Err(invalid());
        }
    };

    if !AuthAppService::verify_password(&body.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login failed: wrong password");
        return Err(invalid());
    }

    let token = state.jwt_secret().issue(user.id)?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
