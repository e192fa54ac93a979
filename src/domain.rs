//! Domain records persisted by the storage layer.
//!
//! Balances and prices are whole credits (no fractional amounts exist in the
//! marketplace). Ledger amounts are signed: positive entries credit an
//! account, negative entries debit it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryCategory {
    Earned,
    Spent,
    Donated,
}

impl EntryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCategory::Earned => "EARNED",
            EntryCategory::Spent => "SPENT",
            EntryCategory::Donated => "DONATED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EARNED" => Some(EntryCategory::Earned),
            "SPENT" => Some(EntryCategory::Spent),
            "DONATED" => Some(EntryCategory::Donated),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking lifecycle status.
///
/// `Booked` is the only non-terminal state; `Completed` and `Cancelled`
/// absorb all further transition attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Booked,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "BOOKED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BOOKED" => Some(BookingStatus::Booked),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Booked)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SkillCategory {
    Academic,
    Arts,
    Business,
    Cooking,
    Fitness,
    Language,
    Music,
    Tech,
    Trades,
    Other,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Academic => "ACADEMIC",
            SkillCategory::Arts => "ARTS",
            SkillCategory::Business => "BUSINESS",
            SkillCategory::Cooking => "COOKING",
            SkillCategory::Fitness => "FITNESS",
            SkillCategory::Language => "LANGUAGE",
            SkillCategory::Music => "MUSIC",
            SkillCategory::Tech => "TECH",
            SkillCategory::Trades => "TRADES",
            SkillCategory::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACADEMIC" => Some(SkillCategory::Academic),
            "ARTS" => Some(SkillCategory::Arts),
            "BUSINESS" => Some(SkillCategory::Business),
            "COOKING" => Some(SkillCategory::Cooking),
            "FITNESS" => Some(SkillCategory::Fitness),
            "LANGUAGE" => Some(SkillCategory::Language),
            "MUSIC" => Some(SkillCategory::Music),
            "TECH" => Some(SkillCategory::Tech),
            "TRADES" => Some(SkillCategory::Trades),
            "OTHER" => Some(SkillCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marketplace member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// Current credit balance. Always equals the sum of the account's
    /// ledger entries after every committed operation.
    pub credits: i64,
    pub karma: i64,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
}

/// One committed, immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic sequence number assigned by storage; orders the ledger.
    pub seq: i64,
    pub account_id: Uuid,
    pub amount: i64,
    pub category: EntryCategory,
    /// The entity this entry is about: a booking, review, project, or the
    /// account itself for the signup grant. At most one entry may exist
    /// per (account, reference, category).
    pub ref_id: Option<Uuid>,
    pub memo: String,
    pub created_at: DateTime<Utc>,
}

/// A requested ledger mutation, not yet committed.
#[derive(Debug, Clone)]
pub struct LedgerPosting {
    pub account_id: Uuid,
    pub amount: i64,
    pub category: EntryCategory,
    pub ref_id: Option<Uuid>,
    pub memo: String,
}

/// An offer to teach a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: SkillCategory,
    /// Snapshotted into each booking at creation; later edits never change
    /// the cost of existing bookings.
    pub price_credits: i64,
    pub lat: f64,
    pub lng: f64,
    pub avg_rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to publish a listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: SkillCategory,
    pub price_credits: i64,
    pub lat: f64,
    pub lng: f64,
}

/// Enumerated listing search parameters.
///
/// Every field is explicit; absent fields do not filter. Inactive listings
/// are excluded unless `include_inactive` is set.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub category: Option<SkillCategory>,
    pub owner: Option<Uuid>,
    pub include_inactive: bool,
    pub limit: Option<u64>,
}

/// A scheduled session between a learner and a listing's owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub learner_id: Uuid,
    pub instructor_id: Uuid,
    /// Listing price at booking time.
    pub price_credits: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// A fully-resolved booking ready for insertion in state `Booked`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub learner_id: Uuid,
    pub instructor_id: Uuid,
    pub price_credits: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: String,
}

/// Feedback tied to exactly one completed booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub reviewer_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A review ready for insertion.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub reviewer_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
}

/// A volunteer initiative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityProject {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub max_volunteers: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to open a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub max_volunteers: i64,
}

/// Membership of an account in a project. Unique per (project, account).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    pub project_id: Uuid,
    pub account_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in [
            EntryCategory::Earned,
            EntryCategory::Spent,
            EntryCategory::Donated,
        ] {
            assert_eq!(EntryCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(EntryCategory::parse("REFUNDED"), None);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!BookingStatus::Booked.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_skill_category_parse() {
        assert_eq!(SkillCategory::parse("TECH"), Some(SkillCategory::Tech));
        assert_eq!(SkillCategory::parse("tech"), None);
        assert_eq!(SkillCategory::Other.as_str(), "OTHER");
    }
}
