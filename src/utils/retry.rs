//! Retry utilities: backoff builders and transient error classification.
//!
//! Uses `backon` for exponential backoff with jitter. Only read-only
//! operations are retried; business-rule failures never succeed on retry
//! and are excluded by the classifier.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::interfaces::StorageError;

/// Standard backoff for read-only storage retries.
///
/// - Min delay: 10ms
/// - Max delay: 1s
/// - Max attempts: 5
/// - Jitter enabled
pub fn read_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(5)
        .with_jitter()
}

/// Whether a raw driver error is a transient fault (connection, pool, or
/// lock contention) rather than a business-rule or data failure.
pub fn is_transient_db(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
        sqlx::Error::Database(db) => {
            let message = db.message();
            message.contains("database is locked") || message.contains("database is busy")
        }
        _ => false,
    }
}

/// Whether a storage error is eligible for retry.
///
/// Typed invariant violations (insufficient funds, invalid transitions,
/// duplicates) are deterministic and never retryable.
pub fn is_transient(err: &StorageError) -> bool {
    matches!(err, StorageError::Database(db) if is_transient_db(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_pool_errors_are_transient() {
        assert!(is_transient(&StorageError::Database(
            sqlx::Error::PoolTimedOut
        )));
        assert!(is_transient(&StorageError::Database(sqlx::Error::Io(
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")
        ))));
    }

    #[test]
    fn test_business_errors_are_not_transient() {
        assert!(!is_transient(&StorageError::NotFound {
            entity: "account",
            id: Uuid::new_v4(),
        }));
        assert!(!is_transient(&StorageError::InsufficientFunds {
            account: Uuid::new_v4(),
            balance: 70,
            requested: -150,
        }));
        assert!(!is_transient(&StorageError::Database(
            sqlx::Error::RowNotFound
        )));
    }
}
