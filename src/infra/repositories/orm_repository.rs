//! Repository backed by the tracked session.
//!
//! Reads go straight to the store through SeaORM's query builder (inside the
//! session's transaction when one is open). Writes are staged on the session
//! and only reach the store on the next `save_changes`.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, EntityTrait, IntoActiveModel, QueryFilter, Value,
};

use super::base::{KeyOf, Repository};
use super::filter::Filter;
use crate::errors::AppResult;
use crate::infra::session::DbSession;

/// Tracked-session implementation of [`Repository`].
pub struct OrmRepository<E> {
    session: Arc<DbSession>,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> OrmRepository<E> {
    pub fn new(session: Arc<DbSession>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }
}

/// Every column marked as changed, so the staged write carries the whole row.
fn full_row<E>(entity: E::Model) -> E::ActiveModel
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    entity.into_active_model().reset_all()
}

#[async_trait]
impl<E> Repository<E> for OrmRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send + Sync + 'static,
    KeyOf<E>: Into<Value> + Clone + Send + Sync,
{
    async fn get_all(&self) -> AppResult<Vec<E::Model>> {
        self.session.fetch_all(E::find()).await
    }

    async fn get_where(&self, filter: Filter<E>) -> AppResult<Vec<E::Model>> {
        self.session
            .fetch_all(E::find().filter(filter.into_condition()))
            .await
    }

    async fn get_by_id(&self, id: KeyOf<E>) -> AppResult<Option<E::Model>> {
        self.session.fetch_one(E::find_by_id(id)).await
    }

    async fn add(&self, entity: E::Model) -> AppResult<E::Model> {
        self.session
            .stage_insert(full_row::<E>(entity.clone()))
            .await?;
        Ok(entity)
    }

    async fn add_many(&self, entities: Vec<E::Model>) -> AppResult<Vec<E::Model>> {
        for entity in &entities {
            self.session
                .stage_insert(full_row::<E>(entity.clone()))
                .await?;
        }
        Ok(entities)
    }

    async fn update(&self, entity: E::Model) -> AppResult<E::Model> {
        self.session
            .stage_update(full_row::<E>(entity.clone()))
            .await?;
        Ok(entity)
    }

    async fn update_many(&self, entities: Vec<E::Model>) -> AppResult<Vec<E::Model>> {
        for entity in &entities {
            self.session
                .stage_update(full_row::<E>(entity.clone()))
                .await?;
        }
        Ok(entities)
    }

    async fn delete(&self, entity: E::Model) -> AppResult<bool> {
        self.session.stage_delete(full_row::<E>(entity)).await?;
        Ok(true)
    }

    async fn delete_by_id(&self, id: KeyOf<E>) -> AppResult<bool> {
        match self.get_by_id(id).await? {
            Some(entity) => self.delete(entity).await,
            None => Ok(false),
        }
    }

    async fn delete_many(&self, entities: Vec<E::Model>) -> AppResult<bool> {
        for entity in entities {
            self.session.stage_delete(full_row::<E>(entity)).await?;
        }
        Ok(true)
    }

    async fn exists(&self, filter: Filter<E>) -> AppResult<bool> {
        let count = self
            .session
            .count(E::find().filter(filter.into_condition()))
            .await?;
        Ok(count > 0)
    }
}
