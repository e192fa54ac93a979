//! Storage implementations.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info};

use crate::config::StorageConfig;
use crate::interfaces::{
    AccountStore, BookingStore, LedgerStore, ListingStore, ProjectStore, ReviewStore,
};

pub mod schema;
pub mod sqlite;

pub use sqlite::{
    SqliteAccountStore, SqliteBookingStore, SqliteLedgerStore, SqliteListingStore,
    SqliteProjectStore, SqliteReviewStore,
};

/// The full set of store handles backed by one database.
///
/// Handles are cheap to clone and are what gets injected into the
/// coordinators; nothing in the crate reaches for an ambient global.
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub listings: Arc<dyn ListingStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub projects: Arc<dyn ProjectStore>,
}

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    info!("Storage: {} at {}", config.storage_type, config.path);

    match config.storage_type.as_str() {
        "sqlite" => {
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.path)).await?;

            init_stores(pool).await
        }
        other => {
            error!("Unknown storage type: {}", other);
            Err(format!("Unknown storage type: {}", other).into())
        }
    }
}

/// Build all stores over an existing pool and create their schemas.
///
/// Used directly by tests with an in-memory pool.
pub async fn init_stores(pool: SqlitePool) -> Result<Stores, Box<dyn std::error::Error>> {
    let accounts = Arc::new(SqliteAccountStore::new(pool.clone()));
    accounts.init().await?;

    let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
    ledger.init().await?;

    let listings = Arc::new(SqliteListingStore::new(pool.clone()));
    listings.init().await?;

    let bookings = Arc::new(SqliteBookingStore::new(pool.clone()));
    bookings.init().await?;

    let reviews = Arc::new(SqliteReviewStore::new(pool.clone()));
    reviews.init().await?;

    let projects = Arc::new(SqliteProjectStore::new(pool));
    projects.init().await?;

    Ok(Stores {
        accounts,
        ledger,
        listings,
        bookings,
        reviews,
        projects,
    })
}
