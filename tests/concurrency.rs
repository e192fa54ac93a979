//! Concurrency properties.
//!
//! These tests run against a file-backed database with a real connection
//! pool, so concurrent operations genuinely contend on storage rather than
//! serializing through a single test connection.

mod common;

use chrono::{Duration, Utc};
use futures::TryStreamExt;
use skillswap::config::{RewardsConfig, StorageConfig};
use skillswap::domain::{EntryCategory, LedgerPosting, NewProject};
use skillswap::interfaces::StorageError;
use skillswap::storage::init_storage;
use skillswap::{CoordinatorError, SkillSwap};
use uuid::Uuid;

async fn file_engine(dir: &tempfile::TempDir) -> SkillSwap {
    let path = dir.path().join("skillswap.db");
    let config = StorageConfig {
        storage_type: "sqlite".to_string(),
        path: path.to_string_lossy().into_owned(),
    };
    let stores = init_storage(&config).await.expect("init storage");
    SkillSwap::new(stores, RewardsConfig::default())
}

#[tokio::test]
async fn test_concurrent_debits_cannot_overdraw() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(&dir).await;

    let learner = common::account(&engine, "a@example.com", "Learner A").await;
    let owner = common::account(&engine, "b@example.com", "Owner B").await;
    // Two of these fit in 100 credits only once.
    let listing = common::listing(&engine, owner, "Masterclass", 60).await;

    let start = Utc::now() + Duration::hours(1);
    let end = start + Duration::hours(1);
    let (first, second) = tokio::join!(
        engine.book_session(listing.id, learner, start, end, None),
        engine.book_session(listing.id, learner, start, end, None),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        CoordinatorError::InsufficientFunds { .. }
    ));

    // Committed state is consistent: one charge, never a negative balance.
    let account = engine.get_account(learner).await.unwrap();
    assert_eq!(account.credits, 40);
    let sum: i64 = engine
        .list_transactions(learner)
        .try_collect::<Vec<_>>()
        .await
        .unwrap()
        .iter()
        .map(|e| e.amount)
        .sum();
    assert_eq!(sum, account.credits);
}

#[tokio::test]
async fn test_concurrent_settlement_has_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(&dir).await;

    let learner = common::account(&engine, "a@example.com", "Learner A").await;
    let owner = common::account(&engine, "b@example.com", "Owner B").await;
    let listing = common::listing(&engine, owner, "Guitar Lessons", 30).await;
    let booking = common::book(&engine, listing.id, learner).await;

    let (complete, cancel) = tokio::join!(
        engine.complete_session(booking.id),
        engine.cancel_session(booking.id),
    );

    assert_eq!(
        [complete.is_ok(), cancel.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count(),
        1
    );

    let learner_balance = engine.get_account(learner).await.unwrap().credits;
    let owner_balance = engine.get_account(owner).await.unwrap().credits;
    if complete.is_ok() {
        assert!(matches!(
            cancel.unwrap_err(),
            CoordinatorError::InvalidTransition { .. }
        ));
        // Payout landed exactly once, no refund.
        assert_eq!(learner_balance, 70);
        assert_eq!(owner_balance, 130);
    } else {
        assert!(matches!(
            complete.unwrap_err(),
            CoordinatorError::InvalidTransition { .. }
        ));
        // Refund landed exactly once, no payout.
        assert_eq!(learner_balance, 100);
        assert_eq!(owner_balance, 100);
    }
}

#[tokio::test]
async fn test_concurrent_join_for_last_slot() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(&dir).await;

    let creator = common::account(&engine, "c@example.com", "Creator C").await;
    let alice = common::account(&engine, "a@example.com", "Alice").await;
    let bob = common::account(&engine, "b@example.com", "Bob").await;
    let project = engine
        .create_project(
            creator,
            NewProject {
                title: "Garden cleanup".to_string(),
                description: "One last pair of hands needed.".to_string(),
                max_volunteers: 1,
            },
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        engine.join_project(project.id, alice),
        engine.join_project(project.id, bob),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        CoordinatorError::CapacityExceeded { .. } | CoordinatorError::AlreadyJoined { .. }
    ));

    // The volunteer count never exceeds capacity and the loser keeps their
    // untouched welcome balance.
    assert_eq!(engine.project_volunteers(project.id).await.unwrap().len(), 1);
    let winner_is_alice = results[0].is_ok();
    let loser_id = if winner_is_alice { bob } else { alice };
    assert_eq!(engine.get_account(loser_id).await.unwrap().credits, 100);
}

#[tokio::test]
async fn test_concurrent_same_account_join_is_joined_once() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(&dir).await;

    let creator = common::account(&engine, "c@example.com", "Creator C").await;
    let alice = common::account(&engine, "a@example.com", "Alice").await;
    let project = engine
        .create_project(
            creator,
            NewProject {
                title: "Garden cleanup".to_string(),
                description: "Weeding and mulching all afternoon.".to_string(),
                max_volunteers: 10,
            },
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        engine.join_project(project.id, alice),
        engine.join_project(project.id, alice),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(matches!(
        results.iter().find(|r| r.is_err()).unwrap().as_ref().unwrap_err(),
        CoordinatorError::AlreadyJoined { .. }
    ));
    // Joined once, paid once.
    assert_eq!(engine.project_volunteers(project.id).await.unwrap().len(), 1);
    assert_eq!(engine.get_account(alice).await.unwrap().credits, 105);
}

#[tokio::test]
async fn test_concurrent_duplicate_grant_posts_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skillswap.db");
    let config = StorageConfig {
        storage_type: "sqlite".to_string(),
        path: path.to_string_lossy().into_owned(),
    };
    let stores = init_storage(&config).await.expect("init storage");

    let account = stores
        .accounts
        .create(skillswap::domain::NewAccount {
            email: "a@example.com".to_string(),
            display_name: "Alice".to_string(),
        })
        .await
        .unwrap()
        .id;

    let reference = Uuid::new_v4();
    let posting = || LedgerPosting {
        account_id: account,
        amount: 10,
        category: EntryCategory::Earned,
        ref_id: Some(reference),
        memo: "grant".to_string(),
    };

    let (first, second) = tokio::join!(
        stores.ledger.post(posting()),
        stores.ledger.post(posting()),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(matches!(
        results.iter().find(|r| r.is_err()).unwrap().as_ref().unwrap_err(),
        StorageError::DuplicateEntry { .. }
    ));
    assert_eq!(stores.ledger.balance(account).await.unwrap(), 10);
}
