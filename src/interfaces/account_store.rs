//! Account persistence interface.

use async_trait::async_trait;
use uuid::Uuid;

use super::ledger_store::Result;
use crate::domain::{Account, NewAccount};

/// Interface for account persistence.
///
/// Accounts are created with a zero balance; the welcome grant is a
/// separate, idempotent ledger posting so the balance always equals the
/// ledger sum, even between the two steps.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account with a zero balance. Fails with `EmailTaken`
    /// if the email is already registered.
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Fetch an account by id.
    async fn get(&self, id: Uuid) -> Result<Account>;

    /// Fetch an account by email, if registered.
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>>;
}
