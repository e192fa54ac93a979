//! Booking persistence interface.

use async_trait::async_trait;
use uuid::Uuid;

use super::ledger_store::Result;
use crate::domain::{Booking, BookingStatus, LedgerPosting, NewBooking};

/// Interface for booking persistence and status transitions.
///
/// Both mutations couple the booking write with its correlated ledger
/// posting in one transaction so the two records can never diverge.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert the booking in state `Booked` and apply the learner's charge.
    /// Both commit together or neither does; an unaffordable charge rolls
    /// back the booking too.
    async fn create_charged(&self, booking: NewBooking, charge: LedgerPosting) -> Result<Booking>;

    /// Transition `Booked` -> `target` and apply the correlated posting in
    /// one transaction. `target` must be a terminal status.
    ///
    /// The transition is a conditional update on the current status, so
    /// exactly one of any set of concurrent callers wins; losers observe
    /// `InvalidTransition` carrying the status they lost to.
    async fn settle(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        posting: LedgerPosting,
    ) -> Result<Booking>;

    /// Fetch a booking by id.
    async fn get(&self, id: Uuid) -> Result<Booking>;

    /// Bookings made by a learner, newest first.
    async fn list_for_learner(&self, learner_id: Uuid) -> Result<Vec<Booking>>;
}
