//! User service - Handles user-related business logic.
//!
//! Orchestrates the user use cases through the Unit of Work, against
//! whichever repository kind the manager was configured with.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::mapping;
use crate::domain::{CreateUser, UpdateUser, UserResponse};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::entities::user::{Column, Entity as UserEntity};
use crate::infra::{Filter, Repository, RepositoryKind, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Every user. An empty store is reported as an error.
    async fn list_users(&self) -> AppResult<Vec<UserResponse>>;

    async fn get_user(&self, id: Uuid) -> AppResult<Option<UserResponse>>;

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<UserResponse>>;

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserResponse>>;

    /// Register a user; username and email must be unused
    async fn create_user(&self, input: CreateUser) -> AppResult<UserResponse>;

    /// Register several users, all or none
    async fn create_users(&self, inputs: Vec<CreateUser>) -> AppResult<Vec<UserResponse>>;

    /// Overwrite the provided fields of an existing user
    async fn update_user(&self, input: UpdateUser) -> AppResult<UserResponse>;

    /// Remove a user; `false` when the id is unknown
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    async fn username_exists(&self, username: &str) -> AppResult<bool>;

    async fn email_exists(&self, email: &str) -> AppResult<bool>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    kind: RepositoryKind,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service on the tracked repository
    pub fn new(uow: Arc<U>) -> Self {
        Self::with_kind(uow, RepositoryKind::default())
    }

    pub fn with_kind(uow: Arc<U>, kind: RepositoryKind) -> Self {
        Self { uow, kind }
    }

    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }

    fn users(&self) -> Arc<dyn Repository<UserEntity>> {
        self.uow.users(self.kind)
    }

    async fn find_one(&self, filter: Filter<UserEntity>) -> AppResult<Option<UserResponse>> {
        let rows = self.users().get_where(filter).await?;
        Ok(rows.into_iter().next().map(UserResponse::from))
    }

    /// Fail with a conflict if either identity is already registered
    async fn ensure_available(
        &self,
        users: &dyn Repository<UserEntity>,
        username: &str,
        email: &str,
    ) -> AppResult<()> {
        if users
            .exists(Filter::eq(Column::Username, username))
            .await?
        {
            return Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        if users.exists(Filter::eq(Column::Email, email)).await? {
            return Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }
        Ok(())
    }
}

/// Reject duplicate usernames or emails inside one batch
fn ensure_distinct(inputs: &[CreateUser]) -> AppResult<()> {
    let mut usernames = HashSet::new();
    let mut emails = HashSet::new();
    for input in inputs {
        if !usernames.insert(input.username.as_str()) {
            return Err(AppError::conflict(format!(
                "Username '{}' appears more than once in the batch",
                input.username
            )));
        }
        if !emails.insert(input.email.as_str()) {
            return Err(AppError::conflict(format!(
                "Email '{}' appears more than once in the batch",
                input.email
            )));
        }
    }
    Ok(())
}

/// A provided, non-empty value that differs from the current one
fn changed<'a>(candidate: &'a Option<String>, current: &str) -> Option<&'a str> {
    candidate
        .as_deref()
        .filter(|value| !value.is_empty() && *value != current)
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn list_users(&self) -> AppResult<Vec<UserResponse>> {
        let rows = self.users().get_all().await?;
        if rows.is_empty() {
            return Err(AppError::internal("No users found"));
        }
        Ok(rows.into_iter().map(UserResponse::from).collect())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<UserResponse>> {
        let row = self.users().get_by_id(id).await?;
        Ok(row.map(UserResponse::from))
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<UserResponse>> {
        self.find_one(Filter::eq(Column::Username, username)).await
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserResponse>> {
        self.find_one(Filter::eq(Column::Email, email)).await
    }

    async fn create_user(&self, input: CreateUser) -> AppResult<UserResponse> {
        let users = self.users();
        self.ensure_available(users.as_ref(), &input.username, &input.email)
            .await?;

        let stored = users.add(mapping::new_user(input)?).await?;
        self.uow.save_changes().await?;

        tracing::info!(user_id = %stored.user_id, kind = %self.kind, "User created");
        Ok(stored.into())
    }

    async fn create_users(&self, inputs: Vec<CreateUser>) -> AppResult<Vec<UserResponse>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        ensure_distinct(&inputs)?;

        let users = self.users();
        for input in &inputs {
            self.ensure_available(users.as_ref(), &input.username, &input.email)
                .await?;
        }
        let rows = inputs
            .into_iter()
            .map(mapping::new_user)
            .collect::<AppResult<Vec<_>>>()?;

        let stored = match self.kind {
            // Runs in its own transaction
            RepositoryKind::Sql => users.add_many(rows).await?,
            RepositoryKind::Tracked => {
                self.uow.begin_transaction().await?;
                match users.add_many(rows).await {
                    Ok(staged) => {
                        self.uow.commit().await?;
                        staged
                    }
                    Err(e) => {
                        if let Err(rollback_err) = self.uow.rollback().await {
                            tracing::error!("Batch create rollback failed: {}", rollback_err);
                        }
                        return Err(e);
                    }
                }
            }
        };

        tracing::info!(count = stored.len(), kind = %self.kind, "Users created");
        Ok(stored.into_iter().map(UserResponse::from).collect())
    }

    async fn update_user(&self, input: UpdateUser) -> AppResult<UserResponse> {
        let users = self.users();
        let existing = users
            .get_by_id(input.user_id)
            .await?
            .ok_or_not_found("User does not exist")?;

        if let Some(username) = changed(&input.username, &existing.username) {
            let taken = Filter::eq(Column::Username, username)
                .and(Filter::ne(Column::UserId, input.user_id));
            if users.exists(taken).await? {
                return Err(AppError::conflict(format!(
                    "Username '{}' is already taken",
                    username
                )));
            }
        }
        if let Some(email) = changed(&input.email, &existing.email) {
            let taken =
                Filter::eq(Column::Email, email).and(Filter::ne(Column::UserId, input.user_id));
            if users.exists(taken).await? {
                return Err(AppError::conflict(format!(
                    "Email '{}' is already registered",
                    email
                )));
            }
        }

        let updated = users.update(mapping::apply_update(existing, input)).await?;
        self.uow.save_changes().await?;

        tracing::info!(user_id = %updated.user_id, kind = %self.kind, "User updated");
        Ok(updated.into())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let users = self.users();
        let Some(existing) = users.get_by_id(id).await? else {
            return Ok(false);
        };

        let deleted = users.delete(existing).await?;
        self.uow.save_changes().await?;

        tracing::info!(user_id = %id, kind = %self.kind, "User deleted");
        Ok(deleted)
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        self.users()
            .exists(Filter::eq(Column::Username, username))
            .await
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.users().exists(Filter::eq(Column::Email, email)).await
    }
}
