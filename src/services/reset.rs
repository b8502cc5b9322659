//! Password-reset tokens: a random value travels in the email link, only a
//! keyed SHA-256 of it is stored.

use crate::error::{AppError, AppResult};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_BYTES: usize = 32;

/// Longest accepted reset-link lifetime: one week.
pub const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;

/// A freshly issued token. `token` goes to the user, `token_hash` to the database.
#[derive(Debug)]
pub struct IssuedResetToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ResetTokenService {
    secret: String,
    ttl: Duration,
}

impl ResetTokenService {
    /// `ttl_minutes` is clamped to `1..=MAX_TTL_MINUTES`.
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl: Duration::minutes(ttl_minutes.clamp(1, MAX_TTL_MINUTES)),
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }

    pub fn issue(&self) -> AppResult<IssuedResetToken> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let token_hash = self.hash(&token)?;
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("reset token expiry out of range")))?;
        Ok(IssuedResetToken {
            token,
            token_hash,
            expires_at,
        })
    }

    pub fn hash(&self, token: &str) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init: {}", e)))?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Cheap shape check so obviously bogus tokens never reach the database.
    pub fn is_well_formed(token: &str) -> bool {
        token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ResetTokenService {
        ResetTokenService::new("reset-secret".to_string(), 60)
    }

    #[test]
    fn issued_token_is_64_hex_chars() {
        let issued = service().issue().unwrap();
        assert_eq!(issued.token.len(), 64);
        assert!(ResetTokenService::is_well_formed(&issued.token));
    }

    #[test]
    fn stored_hash_matches_rehash_but_not_token() {
        let svc = service();
        let issued = svc.issue().unwrap();
        assert_eq!(svc.hash(&issued.token).unwrap(), issued.token_hash);
        assert_ne!(issued.token, issued.token_hash);
    }

    #[test]
    fn hash_depends_on_secret() {
        let other = ResetTokenService::new("different".to_string(), 60);
        let token = "ab".repeat(32);
        assert_ne!(service().hash(&token).unwrap(), other.hash(&token).unwrap());
    }

    #[test]
    fn tokens_are_unique() {
        let svc = service();
        assert_ne!(svc.issue().unwrap().token, svc.issue().unwrap().token);
    }

    #[test]
    fn expiry_follows_ttl() {
        let svc = ResetTokenService::new("s".to_string(), 30);
        let before = Utc::now();
        let issued = svc.issue().unwrap();
        let ttl = issued.expires_at - before;
        assert!(ttl <= Duration::minutes(30) && ttl > Duration::minutes(29));
        assert_eq!(svc.ttl_minutes(), 30);
    }

    #[test]
    fn oversized_ttl_is_clamped_instead_of_overflowing() {
        let svc = ResetTokenService::new("s".to_string(), 1_000_000_000_000);
        assert_eq!(svc.ttl_minutes(), MAX_TTL_MINUTES);
        let issued = svc.issue().unwrap();
        assert!(issued.expires_at > Utc::now() + Duration::days(6));

        let svc = ResetTokenService::new("s".to_string(), i64::MAX);
        assert!(svc.issue().is_ok());
        assert_eq!(ResetTokenService::new("s".to_string(), -5).ttl_minutes(), 1);
    }

    #[test]
    fn well_formed_rejects_junk() {
        assert!(!ResetTokenService::is_well_formed("short"));
        assert!(!ResetTokenService::is_well_formed(&"zz".repeat(32)));
        assert!(ResetTokenService::is_well_formed(&"0f".repeat(32)));
    }
}
