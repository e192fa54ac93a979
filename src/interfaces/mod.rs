//! Storage interfaces.
//!
//! Each store is a trait object injected into the coordinators at
//! construction time; there is no ambient storage handle. Operations that
//! must not diverge (a record mutation and its correlated ledger posting)
//! are expressed as single composite methods so implementations can commit
//! them in one transaction.

pub mod account_store;
pub mod booking_store;
pub mod ledger_store;
pub mod listing_store;
pub mod project_store;
pub mod review_store;

pub use account_store::AccountStore;
pub use booking_store::BookingStore;
pub use ledger_store::{history, LedgerStore, Result, StorageError, HISTORY_PAGE_SIZE};
pub use listing_store::ListingStore;
pub use project_store::ProjectStore;
pub use review_store::ReviewStore;
