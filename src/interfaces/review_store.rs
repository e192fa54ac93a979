//! Review persistence interface.

use async_trait::async_trait;
use uuid::Uuid;

use super::ledger_store::Result;
use crate::domain::{LedgerPosting, NewReview, Review};

/// Interface for review persistence.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert the review, recompute the listing's aggregate rating, and
    /// apply the reviewer's reward posting, all in one transaction.
    ///
    /// A second review for the same booking fails with `DuplicateReview`
    /// and pays nothing.
    async fn create_rewarded(&self, review: NewReview, reward: LedgerPosting) -> Result<Review>;

    /// Fetch a review by id.
    async fn get(&self, id: Uuid) -> Result<Review>;

    /// Reviews for a listing, newest first.
    async fn list_for_listing(&self, listing_id: Uuid) -> Result<Vec<Review>>;
}
