//! Booking lifecycle coordinator.
//!
//! The single entry point for creating bookings and moving them through
//! the BOOKED -> COMPLETED | CANCELLED state machine. Every mutation is
//! delegated to the store as one composite transaction, so a booking and
//! its ledger postings can never diverge.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, EntryCategory, LedgerPosting, NewBooking};
use crate::interfaces::{BookingStore, ListingStore};
use crate::validation;

use super::error::{CoordinatorError, Result};

/// Coordinates booking creation and settlement with the credit ledger.
pub struct BookingCoordinator {
    bookings: Arc<dyn BookingStore>,
    listings: Arc<dyn ListingStore>,
}

impl BookingCoordinator {
    pub fn new(bookings: Arc<dyn BookingStore>, listings: Arc<dyn ListingStore>) -> Self {
        Self { bookings, listings }
    }

    /// Book a session against a listing.
    ///
    /// The listing price is snapshotted into the booking; later price edits
    /// never change what was charged. The booking insert and the learner's
    /// SPENT posting commit together, and an unaffordable charge rolls both
    /// back with `InsufficientFunds`.
    pub async fn book_session(
        &self,
        listing_id: Uuid,
        learner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Booking> {
        let listing = self.listings.get(listing_id).await?;
        if !listing.is_active {
            return Err(CoordinatorError::NotFound {
                entity: "listing",
                id: listing_id,
            });
        }

        validation::validate_booking_request(&listing, learner_id, start, end, Utc::now())
            .map_err(CoordinatorError::Validation)?;

        let booking_id = Uuid::new_v4();
        let charge = LedgerPosting {
            account_id: learner_id,
            amount: -listing.price_credits,
            category: EntryCategory::Spent,
            ref_id: Some(booking_id),
            memo: format!("Booked skill: {}", listing.title),
        };
        let booking = NewBooking {
            id: booking_id,
            listing_id,
            learner_id,
            instructor_id: listing.owner_id,
            price_credits: listing.price_credits,
            start_time: start,
            end_time: end,
            notes: notes.unwrap_or_default(),
        };

        let booking = self.bookings.create_charged(booking, charge).await?;
        info!(
            booking = %booking.id,
            learner = %learner_id,
            price = booking.price_credits,
            "session booked"
        );
        Ok(booking)
    }

    /// Complete a booked session and pay the instructor the snapshotted
    /// price, correlated to the booking.
    pub async fn complete_session(&self, booking_id: Uuid) -> Result<Booking> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.status.is_terminal() {
            return Err(CoordinatorError::InvalidTransition {
                booking: booking_id,
                current: booking.status,
                requested: BookingStatus::Completed,
            });
        }
        let listing = self.listings.get(booking.listing_id).await?;

        let payout = LedgerPosting {
            account_id: booking.instructor_id,
            amount: booking.price_credits,
            category: EntryCategory::Earned,
            ref_id: Some(booking_id),
            memo: format!("Session payout: {}", listing.title),
        };
        let booking = self
            .bookings
            .settle(booking_id, BookingStatus::Completed, payout)
            .await?;
        info!(
            booking = %booking.id,
            instructor = %booking.instructor_id,
            price = booking.price_credits,
            "session completed"
        );
        Ok(booking)
    }

    /// Cancel a booked session and refund the learner, so the booking's
    /// ledger postings net to zero.
    pub async fn cancel_session(&self, booking_id: Uuid) -> Result<Booking> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.status.is_terminal() {
            return Err(CoordinatorError::InvalidTransition {
                booking: booking_id,
                current: booking.status,
                requested: BookingStatus::Cancelled,
            });
        }
        let listing = self.listings.get(booking.listing_id).await?;

        let refund = LedgerPosting {
            account_id: booking.learner_id,
            amount: booking.price_credits,
            category: EntryCategory::Earned,
            ref_id: Some(booking_id),
            memo: format!("Booking refund: {}", listing.title),
        };
        let booking = self
            .bookings
            .settle(booking_id, BookingStatus::Cancelled, refund)
            .await?;
        info!(
            booking = %booking.id,
            learner = %booking.learner_id,
            price = booking.price_credits,
            "session cancelled"
        );
        Ok(booking)
    }
}
