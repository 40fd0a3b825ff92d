//! Connection parameters for a Jenkins server.
//!
//! The core never reads the environment or the filesystem. Callers build a
//! `ClientConfig` directly or from JSON they loaded themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Server address and the user/API-token pair sent with every request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server: String,
    pub username: String,
    pub token: String,
}

impl ClientConfig {
    pub fn new(server: &str, username: &str, token: &str) -> Self {
        Self {
            server: server.to_string(),
            username: username.to_string(),
            token: token.to_string(),
        }
    }

    /// Deserialize and validate a config such as
    /// `{"server": "https://ci.example.com", "username": "bot", "token": "..."}`.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::EmptyServer);
        }
        if !(self.server.starts_with("http://") || self.server.starts_with("https://")) {
            return Err(ConfigError::UnsupportedScheme(self.server.clone()));
        }
        if self.username.is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
