//! Generic repository contract.
//!
//! Both implementations (tracked session and raw SQL) expose the same async
//! CRUD surface over any SeaORM entity, so callers can hold an
//! `Arc<dyn Repository<E>>` without knowing which one they got.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::{EntityTrait, PrimaryKeyTrait};

use super::filter::Filter;
use crate::errors::{AppError, AppResult};

/// Primary-key value type of an entity
pub type KeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// CRUD operations shared by every repository implementation.
#[async_trait]
pub trait Repository<E: EntityTrait>: Send + Sync {
    /// Load every row
    async fn get_all(&self) -> AppResult<Vec<E::Model>>;

    /// Load the rows matching `filter`
    async fn get_where(&self, filter: Filter<E>) -> AppResult<Vec<E::Model>>;

    /// Find by primary key
    async fn get_by_id(&self, id: KeyOf<E>) -> AppResult<Option<E::Model>>;

    /// Insert a row
    async fn add(&self, entity: E::Model) -> AppResult<E::Model>;

    /// Insert several rows
    async fn add_many(&self, entities: Vec<E::Model>) -> AppResult<Vec<E::Model>>;

    /// Overwrite every non-key column of the row with the same key
    async fn update(&self, entity: E::Model) -> AppResult<E::Model>;

    /// Overwrite several rows
    async fn update_many(&self, entities: Vec<E::Model>) -> AppResult<Vec<E::Model>>;

    /// Remove a row
    async fn delete(&self, entity: E::Model) -> AppResult<bool>;

    /// Remove the row with this key; `false` when there is none
    async fn delete_by_id(&self, id: KeyOf<E>) -> AppResult<bool>;

    /// Remove several rows
    async fn delete_many(&self, entities: Vec<E::Model>) -> AppResult<bool>;

    /// Whether any row matches `filter`
    async fn exists(&self, filter: Filter<E>) -> AppResult<bool>;
}

/// Which repository implementation to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    /// Staged changes through the tracked session, persisted on save
    #[default]
    Tracked,
    /// Hand-built SQL executed immediately
    Sql,
}

impl RepositoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryKind::Tracked => "orm",
            RepositoryKind::Sql => "sql",
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepositoryKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orm" | "tracked" => Ok(RepositoryKind::Tracked),
            "sql" | "raw" => Ok(RepositoryKind::Sql),
            other => Err(AppError::validation(format!(
                "Unknown repository kind '{}', expected 'orm' or 'sql'",
                other
            ))),
        }
    }
}
