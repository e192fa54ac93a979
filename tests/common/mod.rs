//! Shared test helpers.
//!
//! In-memory pools are constrained to a single connection so every store
//! handle observes the same database; concurrency tests use a file-backed
//! database instead (see `concurrency.rs`).

// Not every test binary uses every helper.
#![allow(dead_code)]

use chrono::{Duration, Utc};
use skillswap::config::RewardsConfig;
use skillswap::domain::{Booking, Listing, NewListing, SkillCategory};
use skillswap::storage::{init_stores, Stores};
use skillswap::SkillSwap;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

pub async fn memory_pool() -> sqlx::SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
}

pub async fn memory_stores() -> Stores {
    init_stores(memory_pool().await)
        .await
        .expect("Failed to init stores")
}

pub async fn engine() -> SkillSwap {
    SkillSwap::new(memory_stores().await, RewardsConfig::default())
}

pub fn new_listing(title: &str, price: i64) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: "Learn in a relaxed, friendly environment.".to_string(),
        category: SkillCategory::Music,
        price_credits: price,
        lat: 37.7749,
        lng: -122.4194,
    }
}

/// Register an account; starts with the 100-credit welcome grant.
pub async fn account(engine: &SkillSwap, email: &str, name: &str) -> Uuid {
    engine
        .create_account(email, name)
        .await
        .expect("create account")
        .id
}

/// Publish a listing owned by `owner`.
pub async fn listing(engine: &SkillSwap, owner: Uuid, title: &str, price: i64) -> Listing {
    engine
        .create_listing(owner, new_listing(title, price))
        .await
        .expect("create listing")
}

/// Book a one-hour session starting an hour from now.
pub async fn book(engine: &SkillSwap, listing_id: Uuid, learner: Uuid) -> Booking {
    let start = Utc::now() + Duration::hours(1);
    engine
        .book_session(listing_id, learner, start, start + Duration::hours(1), None)
        .await
        .expect("book session")
}
