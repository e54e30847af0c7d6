//! Change-tracking database session.
//!
//! SeaORM executes every statement immediately, so the tracked repository
//! stages its writes here instead. Staged changes are flushed in order by
//! [`DbSession::save_changes`], atomically, inside the open transaction if
//! there is one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, Select, TransactionTrait,
};
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};

/// A write waiting for the next save.
#[async_trait]
trait StagedChange: Send + Sync {
    async fn apply(&self, txn: &DatabaseTransaction) -> Result<u64, DbErr>;
}

enum Change<A> {
    Insert(A),
    Update(A),
    Delete(A),
}

#[async_trait]
impl<A> StagedChange for Change<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    async fn apply(&self, txn: &DatabaseTransaction) -> Result<u64, DbErr> {
        match self {
            Change::Insert(model) => {
                <A::Entity as EntityTrait>::insert(model.clone())
                    .exec_without_returning(txn)
                    .await
            }
            Change::Update(model) => {
                model.clone().update(txn).await?;
                Ok(1)
            }
            Change::Delete(model) => Ok(model.clone().delete(txn).await?.rows_affected),
        }
    }
}

/// Connection, optional open transaction and pending writes of one unit of
/// work.
pub struct DbSession {
    db: Arc<DatabaseConnection>,
    txn: Mutex<Option<DatabaseTransaction>>,
    staged: Mutex<Vec<Box<dyn StagedChange>>>,
    closed: AtomicBool,
}

impl DbSession {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            txn: Mutex::new(None),
            staged: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// The pooled connection the session was opened on
    pub fn connection(&self) -> &Arc<DatabaseConnection> {
        &self.db
    }

    fn ensure_open(&self) -> AppResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AppError::internal("Session has been disposed"));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Staging
    // ---------------------------------------------------------------------

    pub async fn stage_insert<A>(&self, model: A) -> AppResult<()>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        self.stage(Box::new(Change::Insert(model))).await
    }

    pub async fn stage_update<A>(&self, model: A) -> AppResult<()>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        self.stage(Box::new(Change::Update(model))).await
    }

    pub async fn stage_delete<A>(&self, model: A) -> AppResult<()>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        self.stage(Box::new(Change::Delete(model))).await
    }

    async fn stage(&self, change: Box<dyn StagedChange>) -> AppResult<()> {
        self.ensure_open()?;
        self.staged.lock().await.push(change);
        Ok(())
    }

    /// Number of writes waiting for the next save
    pub async fn pending(&self) -> usize {
        self.staged.lock().await.len()
    }

    /// Drop every staged write without applying it
    pub async fn discard(&self) {
        self.staged.lock().await.clear();
    }

    /// Flush staged writes and return the number of affected rows.
    ///
    /// With an open transaction the writes run under a savepoint of it and
    /// become durable on commit. Without one they run in their own
    /// transaction. Either way a failure leaves nothing applied and keeps
    /// the staged writes.
    pub async fn save_changes(&self) -> AppResult<u64> {
        self.ensure_open()?;
        let mut staged = self.staged.lock().await;
        if staged.is_empty() {
            return Ok(0);
        }

        let txn = self.txn.lock().await;
        let scope = match txn.as_ref() {
            Some(outer) => outer.begin().await?,
            None => self.db.begin().await?,
        };

        let mut affected = 0;
        for change in staged.iter() {
            match change.apply(&scope).await {
                Ok(rows) => affected += rows,
                Err(e) => {
                    if let Err(rollback_err) = scope.rollback().await {
                        tracing::error!("Rollback of staged changes failed: {}", rollback_err);
                    }
                    return Err(e.into());
                }
            }
        }
        scope.commit().await?;

        tracing::debug!(changes = staged.len(), affected, "Saved staged changes");
        staged.clear();
        Ok(affected)
    }

    // ---------------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------------

    pub async fn in_transaction(&self) -> bool {
        self.txn.lock().await.is_some()
    }

    pub async fn begin(&self) -> AppResult<()> {
        self.ensure_open()?;
        let mut txn = self.txn.lock().await;
        if txn.is_some() {
            return Err(AppError::internal("A transaction is already open"));
        }
        *txn = Some(self.db.begin().await?);
        tracing::debug!("Transaction started");
        Ok(())
    }

    /// Commit the open transaction; `false` when none was open.
    pub async fn commit(&self) -> AppResult<bool> {
        self.ensure_open()?;
        match self.txn.lock().await.take() {
            Some(txn) => {
                txn.commit().await?;
                tracing::debug!("Transaction committed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Roll back the open transaction; `false` when none was open.
    pub async fn rollback(&self) -> AppResult<bool> {
        match self.txn.lock().await.take() {
            Some(txn) => {
                txn.rollback().await?;
                tracing::debug!("Transaction rolled back");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Roll back, discard staged writes and refuse further use. Idempotent.
    pub async fn close(&self) -> AppResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.discard().await;
        self.rollback().await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub async fn fetch_all<E>(&self, select: Select<E>) -> AppResult<Vec<E::Model>>
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        self.ensure_open()?;
        let txn = self.txn.lock().await;
        let rows = match txn.as_ref() {
            Some(txn) => select.all(txn).await?,
            None => select.all(self.db.as_ref()).await?,
        };
        Ok(rows)
    }

    pub async fn fetch_one<E>(&self, select: Select<E>) -> AppResult<Option<E::Model>>
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        self.ensure_open()?;
        let txn = self.txn.lock().await;
        let row = match txn.as_ref() {
            Some(txn) => select.one(txn).await?,
            None => select.one(self.db.as_ref()).await?,
        };
        Ok(row)
    }

    pub async fn count<E>(&self, select: Select<E>) -> AppResult<u64>
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        self.ensure_open()?;
        let txn = self.txn.lock().await;
        let count = match txn.as_ref() {
            Some(txn) => select.count(txn).await?,
            None => select.count(self.db.as_ref()).await?,
        };
        Ok(count)
    }
}
