//! Coordinator-level error taxonomy.
//!
//! Every variant maps to a stable machine-readable code plus a
//! human-readable message. Storage driver detail never leaks to the
//! caller: database faults become either `Transient` (the caller may
//! retry) or an opaque `Internal`.

use uuid::Uuid;

use crate::domain::BookingStatus;
use crate::interfaces::StorageError;
use crate::utils::retry::is_transient;
use crate::validation::FieldViolation;

/// Result type for coordinator and facade operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

fn violations_summary(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("validation failed: {}", violations_summary(.0))]
    Validation(Vec<FieldViolation>),

    #[error("insufficient funds for account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: Uuid,
        balance: i64,
        requested: i64,
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

    #[error("transient storage failure")]
    Transient(#[source] StorageError),

    #[error("internal error")]
    Internal(#[source] StorageError),
}

impl CoordinatorError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::NotFound { .. } => "NOT_FOUND",
            CoordinatorError::Validation(_) => "VALIDATION_ERROR",
            CoordinatorError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            CoordinatorError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoordinatorError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            CoordinatorError::AlreadyJoined { .. } => "ALREADY_JOINED",
            CoordinatorError::DuplicateReview { .. } => "DUPLICATE_REVIEW",
            CoordinatorError::EmailTaken { .. } => "EMAIL_TAKEN",
            CoordinatorError::Transient(_) => "TRANSIENT_FAILURE",
            CoordinatorError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<StorageError> for CoordinatorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => CoordinatorError::NotFound { entity, id },
            StorageError::InsufficientFunds {
                account,
                balance,
                requested,
            } => CoordinatorError::InsufficientFunds {
                account,
                balance,
                requested,
            },
            StorageError::InvalidTransition {
                booking,
                current,
                requested,
            } => CoordinatorError::InvalidTransition {
                booking,
                current,
                requested,
            },
            StorageError::CapacityExceeded {
                project,
                max_volunteers,
            } => CoordinatorError::CapacityExceeded {
                project,
                max_volunteers,
            },
            StorageError::AlreadyJoined { project, account } => {
                CoordinatorError::AlreadyJoined { project, account }
            }
            StorageError::DuplicateReview { booking } => {
                CoordinatorError::DuplicateReview { booking }
            }
            StorageError::EmailTaken { email } => CoordinatorError::EmailTaken { email },
            err if is_transient(&err) => CoordinatorError::Transient(err),
            err => CoordinatorError::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let id = Uuid::new_v4();
        assert_eq!(
            CoordinatorError::NotFound {
                entity: "listing",
                id
            }
            .code(),
            "NOT_FOUND"
        );
        assert_eq!(
            CoordinatorError::InsufficientFunds {
                account: id,
                balance: 70,
                requested: -150
            }
            .code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(CoordinatorError::Validation(vec![]).code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_storage_not_found_maps_through() {
        let id = Uuid::new_v4();
        let err: CoordinatorError = StorageError::NotFound {
            entity: "booking",
            id,
        }
        .into();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err: CoordinatorError = StorageError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.code(), "TRANSIENT_FAILURE");
    }

    #[test]
    fn test_corrupt_row_is_internal() {
        let err: CoordinatorError = StorageError::Corrupt {
            column: "status",
            value: "UNKNOWN".to_string(),
        }
        .into();
        assert_eq!(err.code(), "INTERNAL");
    }
}
