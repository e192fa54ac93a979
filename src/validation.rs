//! Pure input checks consumed by the coordinators before any mutation.
//!
//! Nothing here touches storage; every function either passes or returns
//! field-level violations for the caller to surface.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Account, Listing, NewListing, NewProject};

/// Limits for validated fields.
pub mod limits {
    /// Maximum title length for listings and projects.
    pub const MAX_TITLE_LENGTH: usize = 120;
    /// Maximum description length for listings and projects.
    pub const MAX_DESCRIPTION_LENGTH: usize = 4096;
    /// Minimum project title length.
    pub const MIN_PROJECT_TITLE_LENGTH: usize = 3;
    /// Minimum project description length.
    pub const MIN_PROJECT_DESCRIPTION_LENGTH: usize = 10;
    /// Minimum display name length.
    pub const MIN_DISPLAY_NAME_LENGTH: usize = 2;
    /// Review star ratings are 1-5 inclusive.
    pub const MIN_RATING: i64 = 1;
    pub const MAX_RATING: i64 = 5;
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const EMAIL_INVALID: &str = "email must contain '@'";
    pub const DISPLAY_NAME_TOO_SHORT: &str = "display name is too short";

    pub const TITLE_EMPTY: &str = "title cannot be empty";
    pub const TITLE_TOO_LONG: &str = "title exceeds maximum length";
    pub const TITLE_TOO_SHORT: &str = "title is too short";
    pub const DESCRIPTION_EMPTY: &str = "description cannot be empty";
    pub const DESCRIPTION_TOO_LONG: &str = "description exceeds maximum length";
    pub const DESCRIPTION_TOO_SHORT: &str = "description is too short";
    pub const PRICE_NEGATIVE: &str = "price cannot be negative";
    pub const LATITUDE_OUT_OF_RANGE: &str = "latitude must be within [-90, 90]";
    pub const LONGITUDE_OUT_OF_RANGE: &str = "longitude must be within [-180, 180]";

    pub const LISTING_INACTIVE: &str = "listing is not active";
    pub const NOT_THE_OWNER: &str = "listing belongs to a different account";
    pub const OWN_LISTING: &str = "cannot book your own listing";
    pub const START_IN_PAST: &str = "start time is in the past";
    pub const WINDOW_INVERTED: &str = "end time must be after start time";

    pub const RATING_OUT_OF_RANGE: &str = "rating must be between 1 and 5";
    pub const REVIEWER_NOT_LEARNER: &str = "only the booking's learner may review it";
    pub const NOT_THE_REVIEWER: &str = "review belongs to a different account";
    pub const NOT_A_VOLUNTEER: &str = "account has not joined this project";

    pub const CAPACITY_TOO_SMALL: &str = "max volunteers must be at least 1";

    pub const AMOUNT_TOO_SMALL: &str = "amount must be at least 1";
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Whether `account` can pay `price`. Negative prices are never affordable.
pub fn can_afford(account: &Account, price: i64) -> bool {
    price >= 0 && account.credits >= price
}

/// Validate a booking request against the listing and the requested window.
///
/// `now` is passed in so callers control the clock.
pub fn validate_booking_request(
    listing: &Listing,
    learner_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    if !listing.is_active {
        violations.push(FieldViolation {
            field: "listing_id",
            message: errmsg::LISTING_INACTIVE,
        });
    }
    if listing.price_credits < 0 {
        violations.push(FieldViolation {
            field: "price_credits",
            message: errmsg::PRICE_NEGATIVE,
        });
    }
    if listing.owner_id == learner_id {
        violations.push(FieldViolation {
            field: "learner_id",
            message: errmsg::OWN_LISTING,
        });
    }
    if start >= end {
        violations.push(FieldViolation {
            field: "end_time",
            message: errmsg::WINDOW_INVERTED,
        });
    }
    if start < now {
        violations.push(FieldViolation {
            field: "start_time",
            message: errmsg::START_IN_PAST,
        });
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validate account registration fields.
pub fn validate_new_account(email: &str, display_name: &str) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    if !email.contains('@') || email.len() < 3 {
        violations.push(FieldViolation {
            field: "email",
            message: errmsg::EMAIL_INVALID,
        });
    }
    if display_name.trim().len() < limits::MIN_DISPLAY_NAME_LENGTH {
        violations.push(FieldViolation {
            field: "display_name",
            message: errmsg::DISPLAY_NAME_TOO_SHORT,
        });
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validate listing fields before publication.
pub fn validate_new_listing(listing: &NewListing) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    if listing.title.trim().is_empty() {
        violations.push(FieldViolation {
            field: "title",
            message: errmsg::TITLE_EMPTY,
        });
    } else if listing.title.len() > limits::MAX_TITLE_LENGTH {
        violations.push(FieldViolation {
            field: "title",
            message: errmsg::TITLE_TOO_LONG,
        });
    }
    if listing.description.trim().is_empty() {
        violations.push(FieldViolation {
            field: "description",
            message: errmsg::DESCRIPTION_EMPTY,
        });
    } else if listing.description.len() > limits::MAX_DESCRIPTION_LENGTH {
        violations.push(FieldViolation {
            field: "description",
            message: errmsg::DESCRIPTION_TOO_LONG,
        });
    }
    if listing.price_credits < 0 {
        violations.push(FieldViolation {
            field: "price_credits",
            message: errmsg::PRICE_NEGATIVE,
        });
    }
    if !(-90.0..=90.0).contains(&listing.lat) {
        violations.push(FieldViolation {
            field: "lat",
            message: errmsg::LATITUDE_OUT_OF_RANGE,
        });
    }
    if !(-180.0..=180.0).contains(&listing.lng) {
        violations.push(FieldViolation {
            field: "lng",
            message: errmsg::LONGITUDE_OUT_OF_RANGE,
        });
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validate a review star rating.
pub fn validate_rating(rating: i64) -> Result<(), Vec<FieldViolation>> {
    if (limits::MIN_RATING..=limits::MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(vec![FieldViolation {
            field: "rating",
            message: errmsg::RATING_OUT_OF_RANGE,
        }])
    }
}

/// Validate project fields before creation.
pub fn validate_new_project(project: &NewProject) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    if project.title.trim().len() < limits::MIN_PROJECT_TITLE_LENGTH {
        violations.push(FieldViolation {
            field: "title",
            message: errmsg::TITLE_TOO_SHORT,
        });
    } else if project.title.len() > limits::MAX_TITLE_LENGTH {
        violations.push(FieldViolation {
            field: "title",
            message: errmsg::TITLE_TOO_LONG,
        });
    }
    if project.description.trim().len() < limits::MIN_PROJECT_DESCRIPTION_LENGTH {
        violations.push(FieldViolation {
            field: "description",
            message: errmsg::DESCRIPTION_TOO_SHORT,
        });
    }
    if project.max_volunteers < 1 {
        violations.push(FieldViolation {
            field: "max_volunteers",
            message: errmsg::CAPACITY_TOO_SMALL,
        });
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validate a donation amount.
pub fn validate_donation(amount: i64) -> Result<(), Vec<FieldViolation>> {
    if amount >= 1 {
        Ok(())
    } else {
        Err(vec![FieldViolation {
            field: "amount",
            message: errmsg::AMOUNT_TOO_SMALL,
        }])
    }
}
