//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::infra::{Database, RepositoryKind};
use crate::services::{ServiceContainer, Services};

/// Application state shared by every handler.
///
/// Holds the service container only; per-request scopes are opened through
/// it, never stored here.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
}

impl AppState {
    /// Wire the real container over a connected database
    pub fn from_database(database: Database, kind: RepositoryKind) -> Self {
        Self::new(Arc::new(Services::new(database, kind)))
    }

    /// State over any container, e.g. a mock in tests
    pub fn new(services: Arc<dyn ServiceContainer>) -> Self {
        Self { services }
    }
}
