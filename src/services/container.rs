//! Service Container - per-request service access.
//!
//! Handlers never hold a service across requests: each call to
//! [`ServiceContainer::users`] opens a fresh unit of work, so every request
//! gets its own session, repositories and transaction scope.

use std::sync::Arc;

use async_trait::async_trait;

use super::{UserManager, UserService};
use crate::errors::AppResult;
use crate::infra::{Database, RepositoryKind};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ServiceContainer: Send + Sync {
    /// User service bound to a new unit of work.
    ///
    /// The scope ends when the service is dropped. A transaction still open
    /// at that point is rolled back.
    fn users(&self) -> Arc<dyn UserService>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    database: Database,
    kind: RepositoryKind,
}

impl Services {
    pub fn new(database: Database, kind: RepositoryKind) -> Self {
        tracing::debug!(kind = %kind, "Service container ready");
        Self { database, kind }
    }

    /// Repository kind handed to every user service
    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }
}

#[async_trait]
impl ServiceContainer for Services {
    fn users(&self) -> Arc<dyn UserService> {
        let uow = Arc::new(self.database.unit_of_work());
        Arc::new(UserManager::with_kind(uow, self.kind))
    }

    async fn ping(&self) -> AppResult<()> {
        self.database.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    #[tokio::test]
    async fn test_ping_runs_probe_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let services = Services::new(Database::from_connection(db), RepositoryKind::Sql);

        assert!(services.ping().await.is_ok());
        assert_eq!(services.kind(), RepositoryKind::Sql);
    }

    #[tokio::test]
    async fn test_each_call_gets_a_fresh_service() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let services = Services::new(Database::from_connection(db), RepositoryKind::Tracked);

        assert!(!Arc::ptr_eq(&services.users(), &services.users()));
    }
}
