//! Authentication support for the save store server.
//!
//! This module provides token-based authentication using HMAC-SHA256.
//! Tokens include an issue time for expiration checking.
//!
//! ## Token Format
//!
//! Tokens are composed of:
//! - 16 bytes: user_id
//! - 8 bytes: issue time (Unix millis, big-endian)
//! - 32 bytes: HMAC-SHA256 signature
//!
//! Total: 56 bytes, hex-encoded for transport.

use crate::error::{ServerError, ServerResult};
use gamesync_protocol::UserId;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const USER_LEN: usize = 16;
const SIGNED_LEN: usize = USER_LEN + 8;
const TOKEN_LEN: usize = SIGNED_LEN + 32;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a configuration whose tokens expire after 24 hours.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Issues and checks user tokens.
#[derive(Clone)]
pub struct TokenValidator {
    config: AuthConfig,
}

impl TokenValidator {
    /// Creates a new token validator.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Creates a token for `user_id`, issued now.
    pub fn create_token(&self, user_id: &UserId) -> ServerResult<String> {
        self.create_token_at(user_id, now_millis())
    }

    /// Creates a token for `user_id` issued at `issued_at` (Unix millis).
    pub fn create_token_at(&self, user_id: &UserId, issued_at: u64) -> ServerResult<String> {
        let mut token = Vec::with_capacity(TOKEN_LEN);
        token.extend_from_slice(user_id.as_bytes());
        token.extend_from_slice(&issued_at.to_be_bytes());

        let signature = self.mac(&token)?.finalize().into_bytes();
        token.extend_from_slice(&signature);
        Ok(to_hex(&token))
    }

    /// Checks that `token` was issued by this server for `expected_user`
    /// and has not expired.
    pub fn validate_token(&self, token: &str, expected_user: &UserId) -> ServerResult<()> {
        let bytes = from_hex(token)
            .filter(|bytes| bytes.len() == TOKEN_LEN)
            .ok_or_else(|| ServerError::NotAuthorized("malformed token".into()))?;

        let (signed, signature) = bytes.split_at(SIGNED_LEN);
        let (user, issued_at) = signed.split_at(USER_LEN);

        if user != expected_user.as_bytes() {
            return Err(ServerError::NotAuthorized("token issued to another user".into()));
        }

        self.mac(signed)?
            .verify_slice(signature)
            .map_err(|_| ServerError::NotAuthorized("invalid signature".into()))?;

        let issued_at = issued_at
            .try_into()
            .map(u64::from_be_bytes)
            .map_err(|_| ServerError::NotAuthorized("malformed token".into()))?;
        let expiry = u64::try_from(self.config.token_expiry.as_millis()).unwrap_or(u64::MAX);
        if now_millis() > issued_at.saturating_add(expiry) {
            return Err(ServerError::NotAuthorized("token expired".into()));
        }

        Ok(())
    }

    fn mac(&self, data: &[u8]) -> ServerResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("invalid hmac key: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("token_expiry", &self.config.token_expiry)
            .finish_non_exhaustive()
    }
}

fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> TokenValidator {
        TokenValidator::new(AuthConfig::new(b"test-secret-key-32-bytes-long!!".to_vec()))
    }

    #[test]
    fn create_and_validate_token() {
        let validator = validator();
        let user = UserId::generate();

        let token = validator.create_token(&user).unwrap();
        assert_eq!(token.len(), TOKEN_LEN * 2);
        assert!(validator.validate_token(&token, &user).is_ok());
    }

    #[test]
    fn reject_wrong_user() {
        let validator = validator();
        let token = validator.create_token(&UserId::generate()).unwrap();
        assert!(validator.validate_token(&token, &UserId::generate()).is_err());
    }

    #[test]
    fn reject_tampered_token() {
        let validator = validator();
        let user = UserId::generate();
        let mut token = validator.create_token(&user).unwrap();

        // Flip the last hex digit of the signature
        let last = token.pop().unwrap();
        token.push(if last == '0' { '1' } else { '0' });

        assert!(validator.validate_token(&token, &user).is_err());
    }

    #[test]
    fn reject_token_from_other_secret() {
        let other = TokenValidator::new(AuthConfig::new(b"another-secret".to_vec()));
        let user = UserId::generate();
        let token = other.create_token(&user).unwrap();
        assert!(validator().validate_token(&token, &user).is_err());
    }

    #[test]
    fn reject_expired_token() {
        let validator = TokenValidator::new(
            AuthConfig::new(b"secret".to_vec()).with_expiry(Duration::from_secs(60)),
        );
        let user = UserId::generate();
        let issued = now_millis() - 61_000;
        let token = validator.create_token_at(&user, issued).unwrap();

        let err = validator.validate_token(&token, &user).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn reject_malformed_token() {
        let validator = validator();
        let user = UserId::generate();
        let short = "00".repeat(TOKEN_LEN - 1);
        for token in ["", "abc", "zz", short.as_str()] {
            assert!(validator.validate_token(token, &user).is_err());
        }
    }

    #[test]
    fn hex_helpers() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x7f]), "00ab7f");
        assert_eq!(from_hex("00ab7f"), Some(vec![0x00, 0xab, 0x7f]));
        assert_eq!(from_hex("0g"), None);
    }
}
