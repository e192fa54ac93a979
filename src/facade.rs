//! The entry point the presentation layer calls.
//!
//! `SkillSwap` is constructed from injected store handles; the acting
//! account is always an explicit parameter. Read-only operations retry
//! transient storage faults with backoff; mutations never retry
//! automatically.

use std::sync::Arc;

use backon::Retryable;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, TryStreamExt};
use uuid::Uuid;

use crate::config::{Config, RewardsConfig};
use crate::domain::{
    Account, Booking, CommunityProject, EntryCategory, LedgerEntry, LedgerPosting, Listing,
    ListingFilter, NewAccount, NewListing, NewProject, Review, Volunteer,
};
use crate::interfaces;
use crate::services::{BookingCoordinator, CoordinatorError, Result, RewardCoordinator};
use crate::storage::{init_storage, Stores};
use crate::utils::retry;
use crate::validation;

/// The SkillSwap core engine.
pub struct SkillSwap {
    stores: Stores,
    booking: BookingCoordinator,
    rewards: RewardCoordinator,
}

impl SkillSwap {
    /// Build the engine over already-initialized stores.
    pub fn new(stores: Stores, rewards: RewardsConfig) -> Self {
        let booking = BookingCoordinator::new(
            Arc::clone(&stores.bookings),
            Arc::clone(&stores.listings),
        );
        let rewards = RewardCoordinator::new(
            Arc::clone(&stores.ledger),
            Arc::clone(&stores.bookings),
            Arc::clone(&stores.reviews),
            Arc::clone(&stores.projects),
            rewards,
        );
        Self {
            stores,
            booking,
            rewards,
        }
    }

    /// Initialize storage from configuration and build the engine.
    pub async fn connect(config: &Config) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let stores = init_storage(&config.storage).await?;
        Ok(Self::new(stores, config.rewards.clone()))
    }

    /// Direct access to the reward coordinator, for grant-level operations.
    pub fn rewards(&self) -> &RewardCoordinator {
        &self.rewards
    }

    // --- Accounts ---

    /// Register an account and grant the welcome bonus.
    ///
    /// The grant is an idempotent posting referenced to the account id, so
    /// a retry after a partial failure completes it without double-paying.
    pub async fn create_account(&self, email: &str, display_name: &str) -> Result<Account> {
        validation::validate_new_account(email, display_name)
            .map_err(CoordinatorError::Validation)?;

        let account = self
            .stores
            .accounts
            .create(NewAccount {
                email: email.to_string(),
                display_name: display_name.to_string(),
            })
            .await?;
        self.rewards.reward_signup(account.id).await?;

        Ok(self.stores.accounts.get(account.id).await?)
    }

    /// Fetch an account by id.
    pub async fn get_account(&self, id: Uuid) -> Result<Account> {
        let account = (|| async { self.stores.accounts.get(id).await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(account)
    }

    /// Move credits from an account into the community pool.
    ///
    /// Returns the new balance. Fails with `InsufficientFunds` if the
    /// account cannot cover the amount.
    pub async fn donate_credits(&self, account_id: Uuid, amount: i64) -> Result<i64> {
        validation::validate_donation(amount).map_err(CoordinatorError::Validation)?;

        self.stores
            .ledger
            .post(LedgerPosting {
                account_id,
                amount: -amount,
                category: EntryCategory::Donated,
                ref_id: None,
                memo: format!("Donated {amount} credits to community pool"),
            })
            .await?;

        Ok(self.stores.ledger.balance(account_id).await?)
    }

    /// The account's ledger entries, newest first, as a lazy restartable
    /// stream.
    pub fn list_transactions(
        &self,
        account_id: Uuid,
    ) -> BoxStream<'static, Result<LedgerEntry>> {
        let stream = interfaces::history(Arc::clone(&self.stores.ledger), account_id)
            .map_err(CoordinatorError::from);
        Box::pin(stream)
    }

    // --- Listings ---

    /// Publish a listing owned by `owner_id`.
    pub async fn create_listing(&self, owner_id: Uuid, listing: NewListing) -> Result<Listing> {
        validation::validate_new_listing(&listing).map_err(CoordinatorError::Validation)?;
        // Owner must be a registered account.
        self.stores.accounts.get(owner_id).await?;
        Ok(self.stores.listings.create(owner_id, listing).await?)
    }

    /// Fetch a listing by id.
    pub async fn get_listing(&self, id: Uuid) -> Result<Listing> {
        let listing = (|| async { self.stores.listings.get(id).await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(listing)
    }

    /// Withdraw a listing. Only the owner may deactivate it; existing
    /// bookings keep their snapshotted price.
    pub async fn deactivate_listing(&self, owner_id: Uuid, listing_id: Uuid) -> Result<()> {
        let listing = self.stores.listings.get(listing_id).await?;
        if listing.owner_id != owner_id {
            return Err(CoordinatorError::Validation(vec![
                validation::FieldViolation {
                    field: "owner_id",
                    message: validation::errmsg::NOT_THE_OWNER,
                },
            ]));
        }
        Ok(self.stores.listings.deactivate(listing_id).await?)
    }

    /// Listings matching the filter, newest first.
    pub async fn search_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let listings = (|| async { self.stores.listings.search(filter).await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(listings)
    }

    // --- Bookings ---

    /// Book a session; charges the learner the listing's current price.
    pub async fn book_session(
        &self,
        listing_id: Uuid,
        learner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Booking> {
        self.booking
            .book_session(listing_id, learner_id, start, end, notes)
            .await
    }

    /// Complete a booked session; pays the instructor.
    pub async fn complete_session(&self, booking_id: Uuid) -> Result<Booking> {
        self.booking.complete_session(booking_id).await
    }

    /// Cancel a booked session; refunds the learner.
    pub async fn cancel_session(&self, booking_id: Uuid) -> Result<Booking> {
        self.booking.cancel_session(booking_id).await
    }

    /// Bookings made by a learner, newest first.
    pub async fn bookings_for(&self, learner_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = (|| async { self.stores.bookings.list_for_learner(learner_id).await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(bookings)
    }

    // --- Reviews ---

    /// Submit a review for a completed booking; rewards the reviewer.
    pub async fn submit_review(
        &self,
        booking_id: Uuid,
        reviewer_id: Uuid,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Review> {
        self.rewards
            .submit_review(booking_id, reviewer_id, rating, comment)
            .await
    }

    /// Reviews for a listing, newest first.
    pub async fn reviews_for_listing(&self, listing_id: Uuid) -> Result<Vec<Review>> {
        let reviews = (|| async { self.stores.reviews.list_for_listing(listing_id).await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(reviews)
    }

    // --- Community projects ---

    /// Open a community project created by `creator_id`.
    pub async fn create_project(
        &self,
        creator_id: Uuid,
        project: NewProject,
    ) -> Result<CommunityProject> {
        validation::validate_new_project(&project).map_err(CoordinatorError::Validation)?;
        self.stores.accounts.get(creator_id).await?;
        Ok(self.stores.projects.create(creator_id, project).await?)
    }

    /// Active projects, newest first.
    pub async fn list_projects(&self) -> Result<Vec<CommunityProject>> {
        let projects = (|| async { self.stores.projects.list_active().await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(projects)
    }

    /// Join a project; grants the join bonus exactly once.
    pub async fn join_project(&self, project_id: Uuid, account_id: Uuid) -> Result<Volunteer> {
        self.rewards.join_project(project_id, account_id).await
    }

    /// Volunteers of a project, oldest first.
    pub async fn project_volunteers(&self, project_id: Uuid) -> Result<Vec<Volunteer>> {
        let volunteers = (|| async { self.stores.projects.volunteers(project_id).await })
            .retry(retry::read_backoff())
            .when(retry::is_transient)
            .await?;
        Ok(volunteers)
    }
}
