//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query
//! building. UUIDs are stored as TEXT, timestamps as RFC 3339 TEXT.

use sea_query::Iden;

/// Accounts table schema.
#[derive(Iden)]
pub enum Accounts {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "email"]
    Email,
    #[iden = "display_name"]
    DisplayName,
    #[iden = "avatar_url"]
    AvatarUrl,
    #[iden = "credits"]
    Credits,
    #[iden = "karma"]
    Karma,
    #[iden = "is_verified"]
    IsVerified,
    #[iden = "created_at"]
    CreatedAt,
}

/// Ledger entries table schema.
#[derive(Iden)]
pub enum LedgerEntries {
    Table,
    #[iden = "seq"]
    Seq,
    #[iden = "account_id"]
    AccountId,
    #[iden = "amount"]
    Amount,
    #[iden = "category"]
    Category,
    #[iden = "ref_id"]
    RefId,
    #[iden = "memo"]
    Memo,
    #[iden = "created_at"]
    CreatedAt,
}

/// Listings table schema.
#[derive(Iden)]
pub enum Listings {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "owner_id"]
    OwnerId,
    #[iden = "title"]
    Title,
    #[iden = "description"]
    Description,
    #[iden = "category"]
    Category,
    #[iden = "price_credits"]
    PriceCredits,
    #[iden = "lat"]
    Lat,
    #[iden = "lng"]
    Lng,
    #[iden = "avg_rating"]
    AvgRating,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
}

/// Bookings table schema.
#[derive(Iden)]
pub enum Bookings {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "listing_id"]
    ListingId,
    #[iden = "learner_id"]
    LearnerId,
    #[iden = "instructor_id"]
    InstructorId,
    #[iden = "price_credits"]
    PriceCredits,
    #[iden = "start_time"]
    StartTime,
    #[iden = "end_time"]
    EndTime,
    #[iden = "status"]
    Status,
    #[iden = "notes"]
    Notes,
    #[iden = "created_at"]
    CreatedAt,
}

/// Reviews table schema.
#[derive(Iden)]
pub enum Reviews {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "listing_id"]
    ListingId,
    #[iden = "reviewer_id"]
    ReviewerId,
    #[iden = "booking_id"]
    BookingId,
    #[iden = "rating"]
    Rating,
    #[iden = "comment"]
    Comment,
    #[iden = "created_at"]
    CreatedAt,
}

/// Community projects table schema.
#[derive(Iden)]
pub enum Projects {
    #[iden = "community_projects"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "creator_id"]
    CreatorId,
    #[iden = "title"]
    Title,
    #[iden = "description"]
    Description,
    #[iden = "max_volunteers"]
    MaxVolunteers,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
}

/// Project volunteers table schema.
#[derive(Iden)]
pub enum Volunteers {
    #[iden = "project_volunteers"]
    Table,
    #[iden = "project_id"]
    ProjectId,
    #[iden = "account_id"]
    AccountId,
    #[iden = "joined_at"]
    JoinedAt,
}

/// SQL for creating the accounts table.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    avatar_url TEXT,
    credits INTEGER NOT NULL DEFAULT 0,
    karma INTEGER NOT NULL DEFAULT 0,
    is_verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
"#;

/// SQL for creating the ledger entries table.
///
/// The partial unique index is the reward-idempotency and double-posting
/// guard: at most one entry per (account, reference, category).
pub const CREATE_LEDGER_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    amount INTEGER NOT NULL,
    category TEXT NOT NULL,
    ref_id TEXT,
    memo TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_account_seq ON ledger_entries(account_id, seq);

CREATE UNIQUE INDEX IF NOT EXISTS idx_ledger_account_ref_category
    ON ledger_entries(account_id, ref_id, category) WHERE ref_id IS NOT NULL;
"#;

/// SQL for creating the listings table.
pub const CREATE_LISTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES accounts(id),
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    price_credits INTEGER NOT NULL,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    avg_rating REAL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category);
"#;

/// SQL for creating the bookings table.
pub const CREATE_BOOKINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bookings (
    id TEXT PRIMARY KEY,
    listing_id TEXT NOT NULL REFERENCES listings(id),
    learner_id TEXT NOT NULL REFERENCES accounts(id),
    instructor_id TEXT NOT NULL REFERENCES accounts(id),
    price_credits INTEGER NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    status TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookings_learner ON bookings(learner_id);
"#;

/// SQL for creating the reviews table.
pub const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    listing_id TEXT NOT NULL REFERENCES listings(id),
    reviewer_id TEXT NOT NULL REFERENCES accounts(id),
    booking_id TEXT NOT NULL UNIQUE REFERENCES bookings(id),
    rating INTEGER NOT NULL,
    comment TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reviews_listing ON reviews(listing_id);
"#;

/// SQL for creating the community projects table.
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS community_projects (
    id TEXT PRIMARY KEY,
    creator_id TEXT NOT NULL REFERENCES accounts(id),
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    max_volunteers INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);
"#;

/// SQL for creating the project volunteers table.
pub const CREATE_VOLUNTEERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS project_volunteers (
    project_id TEXT NOT NULL REFERENCES community_projects(id),
    account_id TEXT NOT NULL REFERENCES accounts(id),
    joined_at TEXT NOT NULL,
    PRIMARY KEY (project_id, account_id)
);
"#;
