//! Unit of Work state machine against in-memory SQLite.

mod common;

use std::sync::Arc;

use layered_user_api::errors::AppError;
use layered_user_api::infra::{RepositoryKind, UnitOfWork};

use common::{database, user_row, usernames};

#[tokio::test]
async fn test_commit_persists_staged_writes() {
    let db = database().await;
    let uow = db.unit_of_work();

    uow.begin_transaction().await.unwrap();
    assert!(uow.in_transaction().await);
    uow.users(RepositoryKind::Tracked)
        .add(user_row("alice"))
        .await
        .unwrap();
    uow.commit().await.unwrap();
    assert!(!uow.in_transaction().await);

    let fresh = db.unit_of_work();
    let rows = fresh.users(RepositoryKind::Tracked).get_all().await.unwrap();
    assert_eq!(usernames(&rows), vec!["alice"]);
}

#[tokio::test]
async fn test_rollback_discards_saved_and_staged_writes() {
    let db = database().await;
    let uow = db.unit_of_work();
    let users = uow.users(RepositoryKind::Tracked);

    uow.begin_transaction().await.unwrap();
    users.add(user_row("alice")).await.unwrap();
    assert_eq!(uow.save_changes().await.unwrap(), 1);
    users.add(user_row("bob")).await.unwrap();

    // Saved rows are visible inside the transaction
    assert_eq!(usernames(&users.get_all().await.unwrap()), vec!["alice"]);

    uow.rollback().await.unwrap();

    assert!(!uow.in_transaction().await);
    assert_eq!(uow.pending_changes().await, 0);
    assert!(users.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_begin_fails() {
    let db = database().await;
    let uow = db.unit_of_work();

    uow.begin_transaction().await.unwrap();
    assert!(uow.begin_transaction().await.is_err());

    // The first transaction is still usable
    assert!(uow.in_transaction().await);
    uow.rollback().await.unwrap();
}

#[tokio::test]
async fn test_failed_commit_rolls_back_and_returns_error() {
    let db = database().await;
    let uow = db.unit_of_work();
    let users = uow.users(RepositoryKind::Tracked);

    let mut clash = user_row("alice");
    clash.email = "second@example.com".into();

    uow.begin_transaction().await.unwrap();
    users.add(user_row("alice")).await.unwrap();
    users.add(clash).await.unwrap();
    let err = uow.commit().await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert!(!uow.in_transaction().await);
    assert_eq!(uow.pending_changes().await, 0);
    assert!(users.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_without_transaction_saves() {
    let db = database().await;
    let uow = db.unit_of_work();

    uow.users(RepositoryKind::Tracked)
        .add(user_row("alice"))
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let rows = uow.users(RepositoryKind::Sql).get_all().await.unwrap();
    assert_eq!(usernames(&rows), vec!["alice"]);
}

#[tokio::test]
async fn test_dispose_rolls_back_and_is_idempotent() {
    let db = database().await;
    let uow = db.unit_of_work();

    uow.begin_transaction().await.unwrap();
    uow.users(RepositoryKind::Tracked)
        .add(user_row("alice"))
        .await
        .unwrap();
    uow.save_changes().await.unwrap();

    uow.dispose().await.unwrap();
    uow.dispose().await.unwrap();
    assert!(uow.begin_transaction().await.is_err());

    let fresh = db.unit_of_work();
    assert!(fresh
        .users(RepositoryKind::Sql)
        .get_all()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_repositories_memoized_per_scope() {
    let db = database().await;
    let first = db.unit_of_work();
    let second = db.unit_of_work();

    let tracked = first.users(RepositoryKind::Tracked);
    assert!(Arc::ptr_eq(&tracked, &first.users(RepositoryKind::Tracked)));
    assert!(!Arc::ptr_eq(&tracked, &second.users(RepositoryKind::Tracked)));
}

#[tokio::test]
async fn test_dropping_an_open_scope_rolls_back() {
    let db = database().await;

    {
        let uow = db.unit_of_work();
        uow.begin_transaction().await.unwrap();
        uow.users(RepositoryKind::Tracked)
            .add(user_row("alice"))
            .await
            .unwrap();
        assert_eq!(uow.save_changes().await.unwrap(), 1);
    }

    let fresh = db.unit_of_work();
    assert!(fresh
        .users(RepositoryKind::Sql)
        .get_all()
        .await
        .unwrap()
        .is_empty());
}
