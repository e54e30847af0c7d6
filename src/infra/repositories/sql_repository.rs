//! Repository that writes its own SQL.
//!
//! Statements are assembled from a [`TableMapping`] and run directly on the
//! pooled connection, with no change tracking: every call hits the store
//! immediately. Filters are only pushed down when they are a single
//! `column == constant`; anything else loads the table and filters in memory.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, IdenStatic, ModelTrait, Statement,
    TransactionTrait, TryFromU64, Value,
};

use super::base::{KeyOf, Repository};
use super::filter::Filter;
use super::mapping::TableMapping;
use crate::errors::{AppError, AppResult};

const COUNT_ALIAS: &str = "row_count";

/// Raw-SQL implementation of [`Repository`].
pub struct SqlRepository<E: EntityTrait> {
    db: Arc<DatabaseConnection>,
    mapping: TableMapping<E>,
}

impl<E> SqlRepository<E>
where
    E: EntityTrait,
    E::Model: Sync,
    KeyOf<E>: Into<Value> + Send + Sync,
{
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            mapping: TableMapping::of(),
        }
    }

    fn backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    fn quote(&self, ident: &str) -> String {
        match self.backend() {
            DbBackend::MySql => format!("`{}`", ident),
            _ => format!("\"{}\"", ident),
        }
    }

    fn placeholder(&self, n: usize) -> String {
        match self.backend() {
            DbBackend::Postgres => format!("${}", n),
            _ => "?".to_string(),
        }
    }

    fn table(&self) -> String {
        self.quote(self.mapping.table())
    }

    fn key(&self) -> AppResult<E::Column> {
        self.mapping.key().ok_or_else(|| {
            AppError::internal(format!("Table {} has no primary key", self.mapping.table()))
        })
    }

    fn select_clause(&self) -> String {
        let columns = self
            .mapping
            .columns()
            .iter()
            .map(|c| self.quote(c.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {} FROM {}", columns, self.table())
    }

    fn statement(&self, sql: String, values: Vec<Value>) -> Statement {
        tracing::debug!(sql = %sql, params = values.len(), "Raw SQL");
        Statement::from_sql_and_values(self.backend(), sql, values)
    }

    async fn query<C: ConnectionTrait>(
        &self,
        conn: &C,
        stmt: Statement,
    ) -> AppResult<Vec<E::Model>> {
        Ok(E::find().from_raw_sql(stmt).all(conn).await?)
    }

    async fn query_by_key<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: Value,
    ) -> AppResult<Option<E::Model>> {
        let sql = format!(
            "{} WHERE {} = {}",
            self.select_clause(),
            self.quote(self.key()?.as_str()),
            self.placeholder(1)
        );
        Ok(E::find()
            .from_raw_sql(self.statement(sql, vec![key]))
            .one(conn)
            .await?)
    }

    async fn insert_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        entity: E::Model,
    ) -> AppResult<E::Model> {
        let columns = self.mapping.insert_columns();
        let names = columns
            .iter()
            .map(|c| self.quote(c.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|n| self.placeholder(n))
            .collect::<Vec<_>>()
            .join(", ");
        let values = columns.iter().map(|c| entity.get(*c)).collect();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            names,
            placeholders
        );

        if !self.mapping.key_generated() {
            conn.execute(self.statement(sql, values)).await?;
            return Ok(entity);
        }

        // Read the stored row back so the generated key reaches the caller
        if conn.support_returning() {
            let returning = self
                .mapping
                .columns()
                .iter()
                .map(|c| self.quote(c.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" RETURNING {}", returning));
            E::find()
                .from_raw_sql(self.statement(sql, values))
                .one(conn)
                .await?
                .ok_or_else(|| AppError::internal("Insert returned no row"))
        } else {
            let result = conn.execute(self.statement(sql, values)).await?;
            let key = <KeyOf<E> as TryFromU64>::try_from_u64(result.last_insert_id())?;
            self.query_by_key(conn, key.into())
                .await?
                .ok_or_else(|| AppError::internal("Inserted row could not be read back"))
        }
    }

    async fn update_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        entity: E::Model,
    ) -> AppResult<E::Model> {
        let key = self.key()?;
        let columns = self.mapping.update_columns();
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", self.quote(c.as_str()), self.placeholder(i + 1)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<Value> = columns.iter().map(|c| entity.get(*c)).collect();
        values.push(entity.get(key));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table(),
            assignments,
            self.quote(key.as_str()),
            self.placeholder(columns.len() + 1)
        );
        let result = conn.execute(self.statement(sql, values)).await?;
        if result.rows_affected() == 0 {
            tracing::debug!(table = self.mapping.table(), "Update matched no row");
        }
        Ok(entity)
    }

    async fn delete_keys(&self, keys: Vec<Value>) -> AppResult<bool> {
        if keys.is_empty() {
            return Ok(true);
        }
        let key = self.key()?;
        let sql = if keys.len() == 1 {
            format!(
                "DELETE FROM {} WHERE {} = {}",
                self.table(),
                self.quote(key.as_str()),
                self.placeholder(1)
            )
        } else {
            let placeholders = (1..=keys.len())
                .map(|n| self.placeholder(n))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "DELETE FROM {} WHERE {} IN ({})",
                self.table(),
                self.quote(key.as_str()),
                placeholders
            )
        };
        let result = self.db.execute(self.statement(sql, keys)).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl<E> Repository<E> for SqlRepository<E>
where
    E: EntityTrait,
    E::Model: Sync,
    KeyOf<E>: Into<Value> + Send + Sync,
{
    async fn get_all(&self) -> AppResult<Vec<E::Model>> {
        let stmt = self.statement(self.select_clause(), Vec::new());
        self.query(self.db.as_ref(), stmt).await
    }

    async fn get_where(&self, filter: Filter<E>) -> AppResult<Vec<E::Model>> {
        if let Some((column, value)) = filter.as_equality() {
            let sql = format!(
                "{} WHERE {} = {}",
                self.select_clause(),
                self.quote(column.as_str()),
                self.placeholder(1)
            );
            let stmt = self.statement(sql, vec![value.clone()]);
            return self.query(self.db.as_ref(), stmt).await;
        }

        tracing::warn!(
            table = self.mapping.table(),
            "Filter cannot be translated to SQL, filtering the full table in memory"
        );
        let rows = self.get_all().await?;
        Ok(rows.into_iter().filter(|row| filter.matches(row)).collect())
    }

    async fn get_by_id(&self, id: KeyOf<E>) -> AppResult<Option<E::Model>> {
        self.query_by_key(self.db.as_ref(), id.into()).await
    }

    async fn add(&self, entity: E::Model) -> AppResult<E::Model> {
        self.insert_with(self.db.as_ref(), entity).await
    }

    async fn add_many(&self, entities: Vec<E::Model>) -> AppResult<Vec<E::Model>> {
        let txn = self.db.begin().await?;
        let mut stored = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.insert_with(&txn, entity).await {
                Ok(model) => stored.push(model),
                Err(e) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        tracing::error!("Batch insert rollback failed: {}", rollback_err);
                    }
                    return Err(e);
                }
            }
        }
        txn.commit().await?;
        Ok(stored)
    }

    async fn update(&self, entity: E::Model) -> AppResult<E::Model> {
        self.update_with(self.db.as_ref(), entity).await
    }

    async fn update_many(&self, entities: Vec<E::Model>) -> AppResult<Vec<E::Model>> {
        let txn = self.db.begin().await?;
        let mut stored = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.update_with(&txn, entity).await {
                Ok(model) => stored.push(model),
                Err(e) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        tracing::error!("Batch update rollback failed: {}", rollback_err);
                    }
                    return Err(e);
                }
            }
        }
        txn.commit().await?;
        Ok(stored)
    }

    async fn delete(&self, entity: E::Model) -> AppResult<bool> {
        let key = entity.get(self.key()?);
        self.delete_keys(vec![key]).await
    }

    async fn delete_by_id(&self, id: KeyOf<E>) -> AppResult<bool> {
        self.delete_keys(vec![id.into()]).await
    }

    async fn delete_many(&self, entities: Vec<E::Model>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(true);
        }
        let key = self.key()?;
        let keys = entities.iter().map(|e| e.get(key)).collect();
        self.delete_keys(keys).await
    }

    async fn exists(&self, filter: Filter<E>) -> AppResult<bool> {
        let Some((column, value)) = filter.as_equality() else {
            return Ok(!self.get_where(filter).await?.is_empty());
        };

        let sql = format!(
            "SELECT COUNT(1) AS {} FROM {} WHERE {} = {}",
            self.quote(COUNT_ALIAS),
            self.table(),
            self.quote(column.as_str()),
            self.placeholder(1)
        );
        let row = self
            .db
            .query_one(self.statement(sql, vec![value.clone()]))
            .await?
            .ok_or_else(|| AppError::internal("COUNT returned no row"))?;
        let count: i64 = row.try_get("", COUNT_ALIAS)?;
        Ok(count > 0)
    }
}
