//! Unit of Work pattern implementation.
//!
//! One `Persistence` per request: it owns the tracked session, hands out
//! memoized repositories and drives the transaction state machine
//! `idle -> active -> committed | rolled back -> idle`.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use sea_orm::DatabaseConnection;

use super::repositories::entities::UserEntity;
use super::repositories::{Repository, RepositoryFactory, RepositoryKind};
use super::session::DbSession;
use crate::errors::AppResult;

/// Unit of Work trait for dependency injection.
///
/// Provides the repositories of one scope and the transaction that spans
/// their tracked writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// User repository of the given kind, built on first request
    fn users(&self, kind: RepositoryKind) -> Arc<dyn Repository<UserEntity>>;

    /// Open a transaction. Fails if one is already open.
    async fn begin_transaction(&self) -> AppResult<()>;

    /// Save staged changes and commit the open transaction, if any.
    ///
    /// On failure everything is rolled back and the original error returned.
    async fn commit(&self) -> AppResult<()>;

    /// Roll back the open transaction and drop staged changes
    async fn rollback(&self) -> AppResult<()>;

    /// Persist staged changes, returning the affected row count
    async fn save_changes(&self) -> AppResult<u64>;

    async fn in_transaction(&self) -> bool;

    /// Release the scope. Safe to call more than once.
    async fn dispose(&self) -> AppResult<()>;
}

/// Memoized repositories, one slot per (entity, kind).
#[derive(Default)]
struct Repositories {
    users_tracked: OnceCell<Arc<dyn Repository<UserEntity>>>,
    users_sql: OnceCell<Arc<dyn Repository<UserEntity>>>,
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    session: Arc<DbSession>,
    factory: RepositoryFactory,
    repositories: Repositories,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let session = Arc::new(DbSession::new(db));
        let factory = RepositoryFactory::new(session.clone());
        Self {
            session,
            factory,
            repositories: Repositories::default(),
        }
    }

    /// Writes staged on the tracked session and not yet saved
    pub async fn pending_changes(&self) -> usize {
        self.session.pending().await
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self, kind: RepositoryKind) -> Arc<dyn Repository<UserEntity>> {
        let slot = match kind {
            RepositoryKind::Tracked => &self.repositories.users_tracked,
            RepositoryKind::Sql => &self.repositories.users_sql,
        };
        slot.get_or_init(|| self.factory.create::<UserEntity>(kind))
            .clone()
    }

    async fn begin_transaction(&self) -> AppResult<()> {
        self.session.begin().await
    }

    async fn commit(&self) -> AppResult<()> {
        let result = match self.session.save_changes().await {
            Ok(_) => self.session.commit().await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            if let Err(rollback_err) = self.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn rollback(&self) -> AppResult<()> {
        self.session.discard().await;
        self.session.rollback().await?;
        Ok(())
    }

    async fn save_changes(&self) -> AppResult<u64> {
        self.session.save_changes().await
    }

    async fn in_transaction(&self) -> bool {
        self.session.in_transaction().await
    }

    async fn dispose(&self) -> AppResult<()> {
        self.session.close().await
    }
}
