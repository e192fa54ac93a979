//! Ledger persistence interface.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, TryStreamExt};
use uuid::Uuid;

use crate::domain::{BookingStatus, EntryCategory, LedgerEntry, LedgerPosting};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// Invariant violations are detected inside the storage transaction and
/// surfaced as typed variants; raw driver errors never carry business
/// meaning upward.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("insufficient funds for account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: Uuid,
        balance: i64,
        requested: i64,
    },

    #[error("duplicate ledger entry for account {account}: ref {reference}, category {category}")]
    DuplicateEntry {
        account: Uuid,
        reference: Uuid,
        category: EntryCategory,
    },

    #[error("invalid transition for booking {booking}: {current} -> {requested}")]
    InvalidTransition {
        booking: Uuid,
        current: BookingStatus,
        requested: BookingStatus,
    },

    #[error("project {project} is at capacity ({max_volunteers})")]
    CapacityExceeded { project: Uuid, max_volunteers: i64 },

    #[error("account {account} already joined project {project}")]
    AlreadyJoined { project: Uuid, account: Uuid },

    #[error("booking {booking} already reviewed")]
    DuplicateReview { booking: Uuid },

    #[error("email already registered: {email}")]
    EmailTaken { email: String },

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("corrupt column {column}: {value}")]
    Corrupt { column: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Interface for ledger persistence: durable append-only postings and the
/// authoritative current-balance read.
///
/// Implementations:
/// - `SqliteLedgerStore`: SQLite storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append a ledger entry and update the owning account's balance by
    /// the posting's signed amount, as one atomic operation.
    ///
    /// A debit that would push the balance negative fails with
    /// `InsufficientFunds` without committing anything; the affordability
    /// check and the balance write are a single atomic step, never
    /// check-then-act. A posting whose (account, reference, category)
    /// already exists fails with `DuplicateEntry`.
    async fn post(&self, posting: LedgerPosting) -> Result<LedgerEntry>;

    /// Current balance for an account. Reflects all previously committed
    /// postings (read-your-writes).
    async fn balance(&self, account_id: Uuid) -> Result<i64>;

    /// One page of entries for an account, newest first. `before_seq`
    /// restricts to entries with a strictly smaller sequence number; pass
    /// the last sequence of the previous page to continue.
    async fn history_page(
        &self,
        account_id: Uuid,
        before_seq: Option<i64>,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>>;
}

/// Entries fetched per page by [`history`].
pub const HISTORY_PAGE_SIZE: u32 = 64;

/// Lazy, finite, restartable newest-first stream of an account's entries.
///
/// Pages are fetched on demand via keyset pagination over the storage
/// sequence number, so the stream observes a consistent order even while
/// new entries land. Calling again restarts from the newest entry.
pub fn history(
    store: Arc<dyn LedgerStore>,
    account_id: Uuid,
) -> BoxStream<'static, Result<LedgerEntry>> {
    struct PageState {
        cursor: Option<i64>,
        done: bool,
    }

    let pages = stream::try_unfold(
        PageState {
            cursor: None,
            done: false,
        },
        move |state| {
            let store = Arc::clone(&store);
            async move {
                if state.done {
                    return Ok::<_, StorageError>(None);
                }
                let page = store
                    .history_page(account_id, state.cursor, HISTORY_PAGE_SIZE)
                    .await?;
                if page.is_empty() {
                    return Ok(None);
                }
                let next = PageState {
                    cursor: page.last().map(|entry| entry.seq),
                    done: (page.len() as u32) < HISTORY_PAGE_SIZE,
                };
                Ok(Some((stream::iter(page.into_iter().map(Ok)), next)))
            }
        },
    )
    .try_flatten();

    Box::pin(pages)
}
