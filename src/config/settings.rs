//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};
use crate::infra::RepositoryKind;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Connection string shared by both repository implementations
    pub database_url: String,
    pub max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// Repository implementation used by the services
    pub repository_kind: RepositoryKind,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("repository_kind", &self.repository_kind)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            repository_kind: RepositoryKind::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults in
    /// [`crate::config::constants`].
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let repository_kind = match env::var("REPOSITORY_KIND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring REPOSITORY_KIND: {}", e);
                RepositoryKind::default()
            }),
            Err(_) => RepositoryKind::default(),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            repository_kind,
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
