//! Review submission and fixed-amount credit rewards.
//!
//! Every grant is a ledger posting referenced to its triggering entity, so
//! exactly-once is a storage uniqueness constraint, never an in-memory
//! check; concurrent duplicate calls cannot double-pay.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::RewardsConfig;
use crate::domain::{
    BookingStatus, EntryCategory, LedgerEntry, LedgerPosting, NewReview, Review, Volunteer,
};
use crate::interfaces::{BookingStore, LedgerStore, ProjectStore, ReviewStore, StorageError};
use crate::validation::{self, errmsg, FieldViolation};

use super::error::{CoordinatorError, Result};

/// Memos written with each grant.
pub mod memo {
    pub const WELCOME: &str = "Welcome bonus! Start learning and sharing skills.";
    pub const REVIEW: &str = "Thanks for reviewing your session.";
    pub const PROJECT_JOIN: &str = "Thanks for volunteering!";
}

/// Coordinates reviews and reward grants.
pub struct RewardCoordinator {
    ledger: Arc<dyn LedgerStore>,
    bookings: Arc<dyn BookingStore>,
    reviews: Arc<dyn ReviewStore>,
    projects: Arc<dyn ProjectStore>,
    config: RewardsConfig,
}

impl RewardCoordinator {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        bookings: Arc<dyn BookingStore>,
        reviews: Arc<dyn ReviewStore>,
        projects: Arc<dyn ProjectStore>,
        config: RewardsConfig,
    ) -> Self {
        Self {
            ledger,
            bookings,
            reviews,
            projects,
            config,
        }
    }

    /// Post a grant, treating an already-granted reference as a no-op.
    async fn grant(&self, posting: LedgerPosting) -> Result<Option<LedgerEntry>> {
        match self.ledger.post(posting).await {
            Ok(entry) => Ok(Some(entry)),
            Err(StorageError::DuplicateEntry { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// One-time welcome grant, referenced to the account itself.
    ///
    /// Returns `None` if the account was already granted its bonus.
    pub async fn reward_signup(&self, account_id: Uuid) -> Result<Option<LedgerEntry>> {
        let entry = self
            .grant(LedgerPosting {
                account_id,
                amount: self.config.signup_bonus,
                category: EntryCategory::Earned,
                ref_id: Some(account_id),
                memo: memo::WELCOME.to_string(),
            })
            .await?;
        if entry.is_some() {
            info!(account = %account_id, bonus = self.config.signup_bonus, "signup bonus granted");
        }
        Ok(entry)
    }

    /// Submit a review for a completed booking.
    ///
    /// The review insert, the listing's aggregate-rating update, and the
    /// reviewer's reward all commit in one transaction; a duplicate review
    /// pays nothing.
    pub async fn submit_review(
        &self,
        booking_id: Uuid,
        reviewer_id: Uuid,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Review> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.status != BookingStatus::Completed {
            return Err(CoordinatorError::InvalidTransition {
                booking: booking_id,
                current: booking.status,
                requested: BookingStatus::Completed,
            });
        }
        if booking.learner_id != reviewer_id {
            return Err(CoordinatorError::Validation(vec![FieldViolation {
                field: "reviewer_id",
                message: errmsg::REVIEWER_NOT_LEARNER,
            }]));
        }
        validation::validate_rating(rating).map_err(CoordinatorError::Validation)?;

        let review_id = Uuid::new_v4();
        let reward = LedgerPosting {
            account_id: reviewer_id,
            amount: self.config.review_bonus,
            category: EntryCategory::Earned,
            ref_id: Some(review_id),
            memo: memo::REVIEW.to_string(),
        };
        let review = NewReview {
            id: review_id,
            listing_id: booking.listing_id,
            reviewer_id,
            booking_id,
            rating,
            comment,
        };

        let review = self.reviews.create_rewarded(review, reward).await?;
        info!(review = %review.id, booking = %booking_id, rating, "review submitted");
        Ok(review)
    }

    /// Idempotent direct grant for an existing review.
    ///
    /// Returns `None` if this review was already rewarded.
    pub async fn reward_review(
        &self,
        account_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<LedgerEntry>> {
        let review = self.reviews.get(review_id).await?;
        if review.reviewer_id != account_id {
            return Err(CoordinatorError::Validation(vec![FieldViolation {
                field: "account_id",
                message: errmsg::NOT_THE_REVIEWER,
            }]));
        }
        let booking = self.bookings.get(review.booking_id).await?;
        if booking.status != BookingStatus::Completed {
            return Err(CoordinatorError::InvalidTransition {
                booking: booking.id,
                current: booking.status,
                requested: BookingStatus::Completed,
            });
        }

        self.grant(LedgerPosting {
            account_id,
            amount: self.config.review_bonus,
            category: EntryCategory::Earned,
            ref_id: Some(review_id),
            memo: memo::REVIEW.to_string(),
        })
        .await
    }

    /// Join a community project and grant the join bonus, exactly once per
    /// (account, project).
    pub async fn join_project(&self, project_id: Uuid, account_id: Uuid) -> Result<Volunteer> {
        let reward = LedgerPosting {
            account_id,
            amount: self.config.project_join_bonus,
            category: EntryCategory::Earned,
            ref_id: Some(project_id),
            memo: memo::PROJECT_JOIN.to_string(),
        };

        let volunteer = self
            .projects
            .join_rewarded(project_id, account_id, reward)
            .await?;
        info!(project = %project_id, account = %account_id, "volunteer joined");
        Ok(volunteer)
    }

    /// Idempotent direct grant for an existing project membership.
    ///
    /// Returns `None` if this membership was already rewarded.
    pub async fn reward_project_join(
        &self,
        account_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<LedgerEntry>> {
        if !self.projects.is_member(project_id, account_id).await? {
            return Err(CoordinatorError::Validation(vec![FieldViolation {
                field: "account_id",
                message: errmsg::NOT_A_VOLUNTEER,
            }]));
        }

        self.grant(LedgerPosting {
            account_id,
            amount: self.config.project_join_bonus,
            category: EntryCategory::Earned,
            ref_id: Some(project_id),
            memo: memo::PROJECT_JOIN.to_string(),
        })
        .await
    }
}
