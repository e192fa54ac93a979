//! Listing persistence interface.

use async_trait::async_trait;
use uuid::Uuid;

use super::ledger_store::Result;
use crate::domain::{Listing, ListingFilter, NewListing};

/// Interface for listing persistence.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a new active listing owned by `owner_id`.
    async fn create(&self, owner_id: Uuid, listing: NewListing) -> Result<Listing>;

    /// Fetch a listing by id, active or not.
    async fn get(&self, id: Uuid) -> Result<Listing>;

    /// Listings matching the filter, newest first.
    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>>;

    /// Withdraw a listing. Existing bookings keep their snapshotted price.
    async fn deactivate(&self, id: Uuid) -> Result<()>;
}
