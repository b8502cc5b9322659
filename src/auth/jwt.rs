//! JWT issue and validation.

use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtSecret {
    secret: String,
}

impl JwtSecret {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        self.encode_claims(&Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
            iat: now.timestamp(),
        })
    }

    pub fn validate(&self, token: &str) -> AppResult<Uuid> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::Jwt(e.to_string()))?;
        Uuid::parse_str(&data.claims.sub).map_err(|e| AppError::Jwt(e.to_string()))
    }

    fn encode_claims(&self, claims: &Claims) -> AppResult<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> JwtSecret {
        JwtSecret::new("test-jwt-secret-min-32-chars!!!!".to_string())
    }

    #[test]
    fn issued_token_validates_to_same_user() {
        let user_id = Uuid::new_v4();
        let token = secret().issue(user_id).unwrap();
        assert_eq!(secret().validate(&token).unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtSecret::new("another-secret-also-32-characters".to_string());
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(secret().validate(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let token = secret()
            .encode_claims(&Claims {
                sub: Uuid::new_v4().to_string(),
                exp: (now - Duration::hours(2)).timestamp(),
                iat: (now - Duration::days(8)).timestamp(),
            })
            .unwrap();
        assert!(secret().validate(&token).is_err());
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let now = Utc::now();
        let token = secret()
            .encode_claims(&Claims {
                sub: "admin".to_string(),
                exp: (now + Duration::hours(1)).timestamp(),
                iat: now.timestamp(),
            })
            .unwrap();
        assert!(secret().validate(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(secret().validate("not.a.jwt").is_err());
    }
}
