//! Ledger store integration tests.
//!
//! Exercises the posting invariants directly against the storage layer:
//! balance/ledger consistency, atomic affordability checks, and the
//! (account, reference, category) uniqueness guard.

mod common;

use futures::TryStreamExt;
use skillswap::domain::{EntryCategory, LedgerPosting, NewAccount};
use skillswap::interfaces::{history, StorageError};
use tokio_test::assert_ok;
use uuid::Uuid;

fn posting(account_id: Uuid, amount: i64, ref_id: Option<Uuid>) -> LedgerPosting {
    LedgerPosting {
        account_id,
        amount,
        category: if amount < 0 {
            EntryCategory::Spent
        } else {
            EntryCategory::Earned
        },
        ref_id,
        memo: "test posting".to_string(),
    }
}

async fn fresh_account(stores: &skillswap::storage::Stores) -> Uuid {
    stores
        .accounts
        .create(NewAccount {
            email: format!("{}@example.com", Uuid::new_v4()),
            display_name: "Ledger Tester".to_string(),
        })
        .await
        .expect("create account")
        .id
}

#[tokio::test]
async fn test_post_updates_balance() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;

    let entry = assert_ok!(stores.ledger.post(posting(account, 100, Some(account))).await);
    assert_eq!(entry.amount, 100);
    assert_eq!(assert_ok!(stores.ledger.balance(account).await), 100);
}

#[tokio::test]
async fn test_debit_beyond_balance_is_rejected_atomically() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;
    stores
        .ledger
        .post(posting(account, 70, None))
        .await
        .unwrap();

    let err = stores
        .ledger
        .post(posting(account, -150, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::InsufficientFunds {
            balance: 70,
            requested: -150,
            ..
        }
    ));

    // Nothing committed: balance unchanged, no debit entry.
    assert_eq!(stores.ledger.balance(account).await.unwrap(), 70);
    let entries = stores
        .ledger
        .history_page(account, None, 10)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, 70);
}

#[tokio::test]
async fn test_posting_to_unknown_account_is_not_found() {
    let stores = common::memory_stores().await;
    let ghost = Uuid::new_v4();

    let err = stores.ledger.post(posting(ghost, 10, None)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "account", .. }));
}

#[tokio::test]
async fn test_duplicate_reference_posts_exactly_once() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;
    let reference = Uuid::new_v4();

    assert_ok!(stores.ledger.post(posting(account, 10, Some(reference))).await);
    let err = stores
        .ledger
        .post(posting(account, 10, Some(reference)))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateEntry { .. }));

    assert_eq!(stores.ledger.balance(account).await.unwrap(), 10);
}

#[tokio::test]
async fn test_balance_equals_history_sum() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;

    stores.ledger.post(posting(account, 100, None)).await.unwrap();
    stores.ledger.post(posting(account, -30, None)).await.unwrap();
    stores.ledger.post(posting(account, 5, None)).await.unwrap();
    stores.ledger.post(posting(account, -45, None)).await.unwrap();

    let entries: Vec<_> = history(stores.ledger.clone(), account)
        .try_collect()
        .await
        .unwrap();
    let sum: i64 = entries.iter().map(|e| e.amount).sum();
    assert_eq!(sum, stores.ledger.balance(account).await.unwrap());
    assert_eq!(sum, 30);
}

#[tokio::test]
async fn test_history_is_newest_first_and_pages_across_boundary() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;

    // Three more than one page, to force a keyset continuation.
    let total = skillswap::interfaces::HISTORY_PAGE_SIZE as i64 + 3;
    for i in 0..total {
        stores
            .ledger
            .post(posting(account, i + 1, None))
            .await
            .unwrap();
    }

    let entries: Vec<_> = history(stores.ledger.clone(), account)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(entries.len() as i64, total);
    assert!(entries.windows(2).all(|w| w[0].seq > w[1].seq));
    // Newest first: the last posting (amount == total) leads.
    assert_eq!(entries[0].amount, total);
}

#[tokio::test]
async fn test_history_is_restartable() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;
    stores.ledger.post(posting(account, 100, None)).await.unwrap();
    stores.ledger.post(posting(account, -20, None)).await.unwrap();

    let first: Vec<_> = history(stores.ledger.clone(), account)
        .try_collect()
        .await
        .unwrap();
    let second: Vec<_> = history(stores.ledger.clone(), account)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].seq, second[0].seq);
}

#[tokio::test]
async fn test_history_of_empty_account_is_empty() {
    let stores = common::memory_stores().await;
    let account = fresh_account(&stores).await;

    let entries: Vec<_> = history(stores.ledger.clone(), account)
        .try_collect()
        .await
        .unwrap();
    assert!(entries.is_empty());
}
