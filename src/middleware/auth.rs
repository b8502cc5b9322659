//! Auth extractors: bearer JWT required (`AuthUser`) or optional (`MaybeAuthUser`).

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;

/// Extractor: authenticated user ID from JWT (Bearer token).
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Auth("Missing or invalid Authorization header".to_string()))?;
        let user_id = state.jwt_secret().validate(bearer.token())?;
        Ok(AuthUser(user_id))
    }
}

/// Extractor for public routes that personalise output when a valid token is
/// sent. A missing, malformed or expired token yields `None`.
#[derive(Clone, Copy, Debug)]
pub struct MaybeAuthUser(pub Option<Uuid>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(id)) => Ok(MaybeAuthUser(Some(id))),
            Err(e) => {
                if parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
                    debug!(error = %e, "ignoring unusable bearer token on public route");
                }
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
