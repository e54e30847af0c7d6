//! Builds repositories of either kind for any entity.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityName, EntityTrait, IntoActiveModel, Value};

use super::base::{KeyOf, Repository, RepositoryKind};
use super::orm_repository::OrmRepository;
use super::sql_repository::SqlRepository;
use crate::infra::session::DbSession;

/// Hands out repositories bound to one session.
///
/// Tracked repositories share the session, so their writes are flushed
/// together. Raw-SQL repositories run on the session's pooled connection.
#[derive(Clone)]
pub struct RepositoryFactory {
    session: Arc<DbSession>,
}

impl RepositoryFactory {
    pub fn new(session: Arc<DbSession>) -> Self {
        Self { session }
    }

    fn connection(&self) -> Arc<DatabaseConnection> {
        self.session.connection().clone()
    }

    pub fn tracked<E>(&self) -> Arc<dyn Repository<E>>
    where
        E: EntityTrait,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
        E::ActiveModel: Send + Sync + 'static,
        KeyOf<E>: Into<Value> + Clone + Send + Sync,
    {
        Arc::new(OrmRepository::<E>::new(self.session.clone()))
    }

    pub fn sql<E>(&self) -> Arc<dyn Repository<E>>
    where
        E: EntityTrait,
        E::Model: Sync,
        KeyOf<E>: Into<Value> + Send + Sync,
    {
        Arc::new(SqlRepository::<E>::new(self.connection()))
    }

    /// Repository of the requested kind
    pub fn create<E>(&self, kind: RepositoryKind) -> Arc<dyn Repository<E>>
    where
        E: EntityTrait,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
        E::ActiveModel: Send + Sync + 'static,
        KeyOf<E>: Into<Value> + Clone + Send + Sync,
    {
        tracing::debug!(kind = %kind, entity = %E::default().table_name(), "Creating repository");
        match kind {
            RepositoryKind::Tracked => self.tracked::<E>(),
            RepositoryKind::Sql => self.sql::<E>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, MockDatabase};

    use super::*;
    use crate::infra::repositories::entities::user;

    #[tokio::test]
    async fn test_sql_kind_executes_immediately() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let factory = RepositoryFactory::new(Arc::new(DbSession::new(Arc::new(db))));

        let repo = factory.create::<user::Entity>(RepositoryKind::Sql);
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tracked_kind_stages_until_saved() {
        let db = MockDatabase::new(DbBackend::Postgres).into_connection();
        let session = Arc::new(DbSession::new(Arc::new(db)));
        let factory = RepositoryFactory::new(session.clone());

        let repo = factory.create::<user::Entity>(RepositoryKind::Tracked);
        let alice = user::Model {
            user_id: uuid::Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            first_name: None,
            last_name: None,
            phone_number: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            is_active: true,
            registered_at: chrono::Utc::now(),
            last_login: None,
        };
        repo.add(alice).await.unwrap();

        assert_eq!(session.pending().await, 1);
    }
}
