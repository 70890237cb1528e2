//! Server configuration.

use crate::auth::AuthConfig;

/// Default request body limit: 1 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Configuration for the save store server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Largest accepted request body.
    pub max_payload_bytes: usize,
    /// Token validation settings (if auth enabled).
    pub auth: Option<AuthConfig>,
}

impl ServerConfig {
    /// Creates a configuration without authentication.
    pub fn new() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            auth: None,
        }
    }

    /// Sets the largest accepted request body.
    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    /// Enables authentication with the given secret and default expiry.
    pub fn with_auth(self, secret: Vec<u8>) -> Self {
        self.with_auth_config(AuthConfig::new(secret))
    }

    /// Enables authentication with a full auth configuration.
    pub fn with_auth_config(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Returns true if requests must carry a valid token.
    pub fn require_auth(&self) -> bool {
        self.auth.is_some()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_payload_bytes, 1024 * 1024);
        assert!(!config.require_auth());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_max_payload_bytes(4096)
            .with_auth_config(AuthConfig::new(vec![1, 2, 3, 4]).with_expiry(Duration::from_secs(60)));

        assert_eq!(config.max_payload_bytes, 4096);
        assert!(config.require_auth());
        let auth = config.auth.unwrap();
        assert_eq!(auth.secret, vec![1, 2, 3, 4]);
        assert_eq!(auth.token_expiry, Duration::from_secs(60));
    }
}
