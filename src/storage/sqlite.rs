//! SQLite implementations of storage interfaces.
//!
//! Every composite operation (a record write plus its correlated ledger
//! posting) runs in one transaction. Balance checks are part of the update
//! statement itself, so no interleaving of concurrent callers can observe
//! or commit a negative balance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, Func, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, Booking, BookingStatus, CommunityProject, EntryCategory, LedgerEntry, LedgerPosting,
    Listing, ListingFilter, NewAccount, NewBooking, NewListing, NewProject, NewReview, Review,
    SkillCategory, Volunteer,
};
use crate::interfaces::ledger_store::{Result, StorageError};
use crate::interfaces::{
    AccountStore, BookingStore, LedgerStore, ListingStore, ProjectStore, ReviewStore,
};

use super::schema::{
    Accounts, Bookings, LedgerEntries, Listings, Projects, Reviews, Volunteers,
    CREATE_ACCOUNTS_TABLE, CREATE_BOOKINGS_TABLE, CREATE_LEDGER_ENTRIES_TABLE,
    CREATE_LISTINGS_TABLE, CREATE_PROJECTS_TABLE, CREATE_REVIEWS_TABLE, CREATE_VOLUNTEERS_TABLE,
};

fn parse_ts(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StorageError::Corrupt {
            column,
            value: value.to_string(),
        })
}

fn parse_entry_category(value: &str) -> Result<EntryCategory> {
    EntryCategory::parse(value).ok_or_else(|| StorageError::Corrupt {
        column: "category",
        value: value.to_string(),
    })
}

fn parse_booking_status(value: &str) -> Result<BookingStatus> {
    BookingStatus::parse(value).ok_or_else(|| StorageError::Corrupt {
        column: "status",
        value: value.to_string(),
    })
}

fn parse_skill_category(value: &str) -> Result<SkillCategory> {
    SkillCategory::parse(value).ok_or_else(|| StorageError::Corrupt {
        column: "category",
        value: value.to_string(),
    })
}

fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    Ok(Account {
        id: Uuid::parse_str(&id)?,
        email: row.get("email"),
        display_name: row.get("display_name"),
        avatar_url: row.get("avatar_url"),
        credits: row.get("credits"),
        karma: row.get("karma"),
        is_verified: row.get::<i64, _>("is_verified") != 0,
        created_at: parse_ts("created_at", &created_at)?,
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<LedgerEntry> {
    let account_id: String = row.get("account_id");
    let category: String = row.get("category");
    let ref_id: Option<String> = row.get("ref_id");
    let created_at: String = row.get("created_at");
    Ok(LedgerEntry {
        seq: row.get("seq"),
        account_id: Uuid::parse_str(&account_id)?,
        amount: row.get("amount"),
        category: parse_entry_category(&category)?,
        ref_id: ref_id.as_deref().map(Uuid::parse_str).transpose()?,
        memo: row.get("memo"),
        created_at: parse_ts("created_at", &created_at)?,
    })
}

fn row_to_listing(row: &SqliteRow) -> Result<Listing> {
    let id: String = row.get("id");
    let owner_id: String = row.get("owner_id");
    let category: String = row.get("category");
    let created_at: String = row.get("created_at");
    Ok(Listing {
        id: Uuid::parse_str(&id)?,
        owner_id: Uuid::parse_str(&owner_id)?,
        title: row.get("title"),
        description: row.get("description"),
        category: parse_skill_category(&category)?,
        price_credits: row.get("price_credits"),
        lat: row.get("lat"),
        lng: row.get("lng"),
        avg_rating: row.get("avg_rating"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: parse_ts("created_at", &created_at)?,
    })
}

fn row_to_booking(row: &SqliteRow) -> Result<Booking> {
    let id: String = row.get("id");
    let listing_id: String = row.get("listing_id");
    let learner_id: String = row.get("learner_id");
    let instructor_id: String = row.get("instructor_id");
    let status: String = row.get("status");
    let start_time: String = row.get("start_time");
    let end_time: String = row.get("end_time");
    let created_at: String = row.get("created_at");
    Ok(Booking {
        id: Uuid::parse_str(&id)?,
        listing_id: Uuid::parse_str(&listing_id)?,
        learner_id: Uuid::parse_str(&learner_id)?,
        instructor_id: Uuid::parse_str(&instructor_id)?,
        price_credits: row.get("price_credits"),
        start_time: parse_ts("start_time", &start_time)?,
        end_time: parse_ts("end_time", &end_time)?,
        status: parse_booking_status(&status)?,
        notes: row.get("notes"),
        created_at: parse_ts("created_at", &created_at)?,
    })
}

fn row_to_review(row: &SqliteRow) -> Result<Review> {
    let id: String = row.get("id");
    let listing_id: String = row.get("listing_id");
    let reviewer_id: String = row.get("reviewer_id");
    let booking_id: String = row.get("booking_id");
    let created_at: String = row.get("created_at");
    Ok(Review {
        id: Uuid::parse_str(&id)?,
        listing_id: Uuid::parse_str(&listing_id)?,
        reviewer_id: Uuid::parse_str(&reviewer_id)?,
        booking_id: Uuid::parse_str(&booking_id)?,
        rating: row.get("rating"),
        comment: row.get("comment"),
        created_at: parse_ts("created_at", &created_at)?,
    })
}

fn row_to_project(row: &SqliteRow) -> Result<CommunityProject> {
    let id: String = row.get("id");
    let creator_id: String = row.get("creator_id");
    let created_at: String = row.get("created_at");
    Ok(CommunityProject {
        id: Uuid::parse_str(&id)?,
        creator_id: Uuid::parse_str(&creator_id)?,
        title: row.get("title"),
        description: row.get("description"),
        max_volunteers: row.get("max_volunteers"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: parse_ts("created_at", &created_at)?,
    })
}

fn row_to_volunteer(row: &SqliteRow) -> Result<Volunteer> {
    let project_id: String = row.get("project_id");
    let account_id: String = row.get("account_id");
    let joined_at: String = row.get("joined_at");
    Ok(Volunteer {
        project_id: Uuid::parse_str(&project_id)?,
        account_id: Uuid::parse_str(&account_id)?,
        joined_at: parse_ts("joined_at", &joined_at)?,
    })
}

/// Apply one posting inside an open transaction: update the account balance
/// and append the ledger entry.
///
/// The affordability check is part of the update statement's WHERE clause,
/// so two concurrent debits can never both pass against a stale balance.
async fn apply_posting(conn: &mut SqliteConnection, posting: &LedgerPosting) -> Result<LedgerEntry> {
    let account_str = posting.account_id.to_string();

    let update = {
        let mut update = Query::update();
        update
            .table(Accounts::Table)
            .value(
                Accounts::Credits,
                Expr::col(Accounts::Credits).add(posting.amount),
            )
            .and_where(Expr::col(Accounts::Id).eq(account_str.as_str()));
        if posting.amount < 0 {
            update.and_where(Expr::col(Accounts::Credits).gte(-posting.amount));
        }
        update.to_string(SqliteQueryBuilder)
    };

    let updated = sqlx::query(&update).execute(&mut *conn).await?;
    if updated.rows_affected() == 0 {
        let select = Query::select()
            .column(Accounts::Credits)
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Id).eq(account_str.as_str()))
            .to_string(SqliteQueryBuilder);
        let row = sqlx::query(&select).fetch_optional(&mut *conn).await?;
        return match row {
            Some(row) => Err(StorageError::InsufficientFunds {
                account: posting.account_id,
                balance: row.get(0),
                requested: posting.amount,
            }),
            None => Err(StorageError::NotFound {
                entity: "account",
                id: posting.account_id,
            }),
        };
    }

    let created_at = Utc::now();
    let insert = Query::insert()
        .into_table(LedgerEntries::Table)
        .columns([
            LedgerEntries::AccountId,
            LedgerEntries::Amount,
            LedgerEntries::Category,
            LedgerEntries::RefId,
            LedgerEntries::Memo,
            LedgerEntries::CreatedAt,
        ])
        .values_panic([
            account_str.into(),
            posting.amount.into(),
            posting.category.as_str().into(),
            posting.ref_id.map(|id| id.to_string()).into(),
            posting.memo.clone().into(),
            created_at.to_rfc3339().into(),
        ])
        .to_string(SqliteQueryBuilder);

    let inserted = match sqlx::query(&insert).execute(&mut *conn).await {
        Ok(result) => result,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(match posting.ref_id {
                Some(reference) => StorageError::DuplicateEntry {
                    account: posting.account_id,
                    reference,
                    category: posting.category,
                },
                None => StorageError::Database(sqlx::Error::Database(db)),
            });
        }
        Err(err) => return Err(err.into()),
    };

    Ok(LedgerEntry {
        seq: inserted.last_insert_rowid(),
        account_id: posting.account_id,
        amount: posting.amount,
        category: posting.category,
        ref_id: posting.ref_id,
        memo: posting.memo.clone(),
        created_at,
    })
}

/// SQLite implementation of LedgerStore.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_LEDGER_ENTRIES_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn post(&self, posting: LedgerPosting) -> Result<LedgerEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = apply_posting(&mut tx, &posting).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn balance(&self, account_id: Uuid) -> Result<i64> {
        let query = Query::select()
            .column(Accounts::Credits)
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Id).eq(account_id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(row.get(0)),
            None => Err(StorageError::NotFound {
                entity: "account",
                id: account_id,
            }),
        }
    }

    async fn history_page(
        &self,
        account_id: Uuid,
        before_seq: Option<i64>,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>> {
        let query = {
            let mut query = Query::select();
            query
                .columns([
                    LedgerEntries::Seq,
                    LedgerEntries::AccountId,
                    LedgerEntries::Amount,
                    LedgerEntries::Category,
                    LedgerEntries::RefId,
                    LedgerEntries::Memo,
                    LedgerEntries::CreatedAt,
                ])
                .from(LedgerEntries::Table)
                .and_where(Expr::col(LedgerEntries::AccountId).eq(account_id.to_string()))
                .order_by(LedgerEntries::Seq, Order::Desc)
                .limit(limit as u64);
            if let Some(before) = before_seq {
                query.and_where(Expr::col(LedgerEntries::Seq).lt(before));
            }
            query.to_string(SqliteQueryBuilder)
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_entry).collect()
    }
}

/// SQLite implementation of AccountStore.
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new SQLite account store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_ACCOUNTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let insert = Query::insert()
            .into_table(Accounts::Table)
            .columns([
                Accounts::Id,
                Accounts::Email,
                Accounts::DisplayName,
                Accounts::Credits,
                Accounts::Karma,
                Accounts::IsVerified,
                Accounts::CreatedAt,
            ])
            .values_panic([
                id.to_string().into(),
                account.email.clone().into(),
                account.display_name.clone().into(),
                0i64.into(),
                0i64.into(),
                0i64.into(),
                created_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&insert).execute(&self.pool).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StorageError::EmailTaken {
                    email: account.email,
                });
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Account {
            id,
            email: account.email,
            display_name: account.display_name,
            avatar_url: None,
            credits: 0,
            karma: 0,
            is_verified: false,
            created_at,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Account> {
        let query = Query::select()
            .columns([
                Accounts::Id,
                Accounts::Email,
                Accounts::DisplayName,
                Accounts::AvatarUrl,
                Accounts::Credits,
                Accounts::Karma,
                Accounts::IsVerified,
                Accounts::CreatedAt,
            ])
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => row_to_account(&row),
            None => Err(StorageError::NotFound {
                entity: "account",
                id,
            }),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = Query::select()
            .columns([
                Accounts::Id,
                Accounts::Email,
                Accounts::DisplayName,
                Accounts::AvatarUrl,
                Accounts::Credits,
                Accounts::Karma,
                Accounts::IsVerified,
                Accounts::CreatedAt,
            ])
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Email).eq(email))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_account).transpose()
    }
}

/// SQLite implementation of ListingStore.
pub struct SqliteListingStore {
    pool: SqlitePool,
}

impl SqliteListingStore {
    /// Create a new SQLite listing store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_LISTINGS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const LISTING_COLUMNS: [Listings; 11] = [
    Listings::Id,
    Listings::OwnerId,
    Listings::Title,
    Listings::Description,
    Listings::Category,
    Listings::PriceCredits,
    Listings::Lat,
    Listings::Lng,
    Listings::AvgRating,
    Listings::IsActive,
    Listings::CreatedAt,
];

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn create(&self, owner_id: Uuid, listing: NewListing) -> Result<Listing> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let insert = Query::insert()
            .into_table(Listings::Table)
            .columns(LISTING_COLUMNS)
            .values_panic([
                id.to_string().into(),
                owner_id.to_string().into(),
                listing.title.clone().into(),
                listing.description.clone().into(),
                listing.category.as_str().into(),
                listing.price_credits.into(),
                listing.lat.into(),
                listing.lng.into(),
                Option::<f64>::None.into(),
                1i64.into(),
                created_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&insert).execute(&self.pool).await?;

        Ok(Listing {
            id,
            owner_id,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            price_credits: listing.price_credits,
            lat: listing.lat,
            lng: listing.lng,
            avg_rating: None,
            is_active: true,
            created_at,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Listing> {
        let query = Query::select()
            .columns(LISTING_COLUMNS)
            .from(Listings::Table)
            .and_where(Expr::col(Listings::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => row_to_listing(&row),
            None => Err(StorageError::NotFound {
                entity: "listing",
                id,
            }),
        }
    }

    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let query = {
            let mut query = Query::select();
            query
                .columns(LISTING_COLUMNS)
                .from(Listings::Table)
                .order_by(Listings::CreatedAt, Order::Desc);
            if !filter.include_inactive {
                query.and_where(Expr::col(Listings::IsActive).eq(1i64));
            }
            if let Some(category) = filter.category {
                query.and_where(Expr::col(Listings::Category).eq(category.as_str()));
            }
            if let Some(owner) = filter.owner {
                query.and_where(Expr::col(Listings::OwnerId).eq(owner.to_string()));
            }
            if let Some(limit) = filter.limit {
                query.limit(limit);
            }
            query.to_string(SqliteQueryBuilder)
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_listing).collect()
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        let update = Query::update()
            .table(Listings::Table)
            .value(Listings::IsActive, 0i64)
            .and_where(Expr::col(Listings::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&update).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity: "listing",
                id,
            });
        }
        Ok(())
    }
}

/// SQLite implementation of BookingStore.
pub struct SqliteBookingStore {
    pool: SqlitePool,
}

impl SqliteBookingStore {
    /// Create a new SQLite booking store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_BOOKINGS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const BOOKING_COLUMNS: [Bookings; 10] = [
    Bookings::Id,
    Bookings::ListingId,
    Bookings::LearnerId,
    Bookings::InstructorId,
    Bookings::PriceCredits,
    Bookings::StartTime,
    Bookings::EndTime,
    Bookings::Status,
    Bookings::Notes,
    Bookings::CreatedAt,
];

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn create_charged(&self, booking: NewBooking, charge: LedgerPosting) -> Result<Booking> {
        let created_at = Utc::now();

        let insert = Query::insert()
            .into_table(Bookings::Table)
            .columns(BOOKING_COLUMNS)
            .values_panic([
                booking.id.to_string().into(),
                booking.listing_id.to_string().into(),
                booking.learner_id.to_string().into(),
                booking.instructor_id.to_string().into(),
                booking.price_credits.into(),
                booking.start_time.to_rfc3339().into(),
                booking.end_time.to_rfc3339().into(),
                BookingStatus::Booked.as_str().into(),
                booking.notes.clone().into(),
                created_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&insert).execute(&mut *tx).await?;
        apply_posting(&mut tx, &charge).await?;
        tx.commit().await?;

        Ok(Booking {
            id: booking.id,
            listing_id: booking.listing_id,
            learner_id: booking.learner_id,
            instructor_id: booking.instructor_id,
            price_credits: booking.price_credits,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: BookingStatus::Booked,
            notes: booking.notes,
            created_at,
        })
    }

    async fn settle(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        posting: LedgerPosting,
    ) -> Result<Booking> {
        let booking_str = booking_id.to_string();

        let update = Query::update()
            .table(Bookings::Table)
            .value(Bookings::Status, target.as_str())
            .and_where(Expr::col(Bookings::Id).eq(booking_str.as_str()))
            .and_where(Expr::col(Bookings::Status).eq(BookingStatus::Booked.as_str()))
            .to_string(SqliteQueryBuilder);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(&update).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            let select = Query::select()
                .column(Bookings::Status)
                .from(Bookings::Table)
                .and_where(Expr::col(Bookings::Id).eq(booking_str.as_str()))
                .to_string(SqliteQueryBuilder);
            let row = sqlx::query(&select).fetch_optional(&mut *tx).await?;
            return match row {
                Some(row) => {
                    let status: String = row.get(0);
                    Err(StorageError::InvalidTransition {
                        booking: booking_id,
                        current: parse_booking_status(&status)?,
                        requested: target,
                    })
                }
                None => Err(StorageError::NotFound {
                    entity: "booking",
                    id: booking_id,
                }),
            };
        }

        apply_posting(&mut tx, &posting).await?;

        let select = Query::select()
            .columns(BOOKING_COLUMNS)
            .from(Bookings::Table)
            .and_where(Expr::col(Bookings::Id).eq(booking_str.as_str()))
            .to_string(SqliteQueryBuilder);
        let row = sqlx::query(&select).fetch_one(&mut *tx).await?;
        let booking = row_to_booking(&row)?;

        tx.commit().await?;
        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> Result<Booking> {
        let query = Query::select()
            .columns(BOOKING_COLUMNS)
            .from(Bookings::Table)
            .and_where(Expr::col(Bookings::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => row_to_booking(&row),
            None => Err(StorageError::NotFound {
                entity: "booking",
                id,
            }),
        }
    }

    async fn list_for_learner(&self, learner_id: Uuid) -> Result<Vec<Booking>> {
        let query = Query::select()
            .columns(BOOKING_COLUMNS)
            .from(Bookings::Table)
            .and_where(Expr::col(Bookings::LearnerId).eq(learner_id.to_string()))
            .order_by(Bookings::CreatedAt, Order::Desc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_booking).collect()
    }
}

/// SQLite implementation of ReviewStore.
pub struct SqliteReviewStore {
    pool: SqlitePool,
}

impl SqliteReviewStore {
    /// Create a new SQLite review store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_REVIEWS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const REVIEW_COLUMNS: [Reviews; 7] = [
    Reviews::Id,
    Reviews::ListingId,
    Reviews::ReviewerId,
    Reviews::BookingId,
    Reviews::Rating,
    Reviews::Comment,
    Reviews::CreatedAt,
];

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn create_rewarded(&self, review: NewReview, reward: LedgerPosting) -> Result<Review> {
        let created_at = Utc::now();
        let listing_str = review.listing_id.to_string();

        let insert = Query::insert()
            .into_table(Reviews::Table)
            .columns(REVIEW_COLUMNS)
            .values_panic([
                review.id.to_string().into(),
                listing_str.clone().into(),
                review.reviewer_id.to_string().into(),
                review.booking_id.to_string().into(),
                review.rating.into(),
                review.comment.clone().into(),
                created_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        let mut tx = self.pool.begin().await?;

        match sqlx::query(&insert).execute(&mut *tx).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StorageError::DuplicateReview {
                    booking: review.booking_id,
                });
            }
            Err(err) => return Err(err.into()),
        }

        // Recompute the aggregate rating from all reviews of the listing,
        // including the one just inserted.
        let avg_select = Query::select()
            .expr(Func::avg(Expr::col(Reviews::Rating)))
            .from(Reviews::Table)
            .and_where(Expr::col(Reviews::ListingId).eq(listing_str.as_str()))
            .to_string(SqliteQueryBuilder);
        let row = sqlx::query(&avg_select).fetch_one(&mut *tx).await?;
        let avg: f64 = row
            .get::<Option<f64>, _>(0)
            .unwrap_or(review.rating as f64);

        let update = Query::update()
            .table(Listings::Table)
            .value(Listings::AvgRating, avg)
            .and_where(Expr::col(Listings::Id).eq(listing_str.as_str()))
            .to_string(SqliteQueryBuilder);
        sqlx::query(&update).execute(&mut *tx).await?;

        apply_posting(&mut tx, &reward).await?;
        tx.commit().await?;

        Ok(Review {
            id: review.id,
            listing_id: review.listing_id,
            reviewer_id: review.reviewer_id,
            booking_id: review.booking_id,
            rating: review.rating,
            comment: review.comment,
            created_at,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Review> {
        let query = Query::select()
            .columns(REVIEW_COLUMNS)
            .from(Reviews::Table)
            .and_where(Expr::col(Reviews::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => row_to_review(&row),
            None => Err(StorageError::NotFound {
                entity: "review",
                id,
            }),
        }
    }

    async fn list_for_listing(&self, listing_id: Uuid) -> Result<Vec<Review>> {
        let query = Query::select()
            .columns(REVIEW_COLUMNS)
            .from(Reviews::Table)
            .and_where(Expr::col(Reviews::ListingId).eq(listing_id.to_string()))
            .order_by(Reviews::CreatedAt, Order::Desc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_review).collect()
    }
}

/// SQLite implementation of ProjectStore.
pub struct SqliteProjectStore {
    pool: SqlitePool,
}

impl SqliteProjectStore {
    /// Create a new SQLite project store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_PROJECTS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_VOLUNTEERS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const PROJECT_COLUMNS: [Projects; 7] = [
    Projects::Id,
    Projects::CreatorId,
    Projects::Title,
    Projects::Description,
    Projects::MaxVolunteers,
    Projects::IsActive,
    Projects::CreatedAt,
];

#[async_trait]
impl ProjectStore for SqliteProjectStore {
    async fn create(&self, creator_id: Uuid, project: NewProject) -> Result<CommunityProject> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let insert = Query::insert()
            .into_table(Projects::Table)
            .columns(PROJECT_COLUMNS)
            .values_panic([
                id.to_string().into(),
                creator_id.to_string().into(),
                project.title.clone().into(),
                project.description.clone().into(),
                project.max_volunteers.into(),
                1i64.into(),
                created_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&insert).execute(&self.pool).await?;

        Ok(CommunityProject {
            id,
            creator_id,
            title: project.title,
            description: project.description,
            max_volunteers: project.max_volunteers,
            is_active: true,
            created_at,
        })
    }

    async fn get(&self, id: Uuid) -> Result<CommunityProject> {
        let query = Query::select()
            .columns(PROJECT_COLUMNS)
            .from(Projects::Table)
            .and_where(Expr::col(Projects::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => row_to_project(&row),
            None => Err(StorageError::NotFound {
                entity: "project",
                id,
            }),
        }
    }

    async fn list_active(&self) -> Result<Vec<CommunityProject>> {
        let query = Query::select()
            .columns(PROJECT_COLUMNS)
            .from(Projects::Table)
            .and_where(Expr::col(Projects::IsActive).eq(1i64))
            .order_by(Projects::CreatedAt, Order::Desc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_project).collect()
    }

    async fn join_rewarded(
        &self,
        project_id: Uuid,
        account_id: Uuid,
        reward: LedgerPosting,
    ) -> Result<Volunteer> {
        let project_str = project_id.to_string();
        let joined_at = Utc::now();

        // Insert first so the transaction takes the write lock up front;
        // membership uniqueness is the table's primary key.
        let insert = Query::insert()
            .into_table(Volunteers::Table)
            .columns([
                Volunteers::ProjectId,
                Volunteers::AccountId,
                Volunteers::JoinedAt,
            ])
            .values_panic([
                project_str.clone().into(),
                account_id.to_string().into(),
                joined_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        let mut tx = self.pool.begin().await?;

        match sqlx::query(&insert).execute(&mut *tx).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StorageError::AlreadyJoined {
                    project: project_id,
                    account: account_id,
                });
            }
            Err(err) => return Err(err.into()),
        }

        let select = Query::select()
            .columns([Projects::MaxVolunteers, Projects::IsActive])
            .from(Projects::Table)
            .and_where(Expr::col(Projects::Id).eq(project_str.as_str()))
            .to_string(SqliteQueryBuilder);
        let row = sqlx::query(&select).fetch_optional(&mut *tx).await?;
        let max_volunteers = match row {
            Some(row) if row.get::<i64, _>(1) != 0 => row.get::<i64, _>(0),
            _ => {
                return Err(StorageError::NotFound {
                    entity: "project",
                    id: project_id,
                });
            }
        };

        let count_select = Query::select()
            .expr(Expr::col(Volunteers::AccountId).count())
            .from(Volunteers::Table)
            .and_where(Expr::col(Volunteers::ProjectId).eq(project_str.as_str()))
            .to_string(SqliteQueryBuilder);
        let row = sqlx::query(&count_select).fetch_one(&mut *tx).await?;
        let count: i64 = row.get(0);
        if count > max_volunteers {
            return Err(StorageError::CapacityExceeded {
                project: project_id,
                max_volunteers,
            });
        }

        apply_posting(&mut tx, &reward).await?;
        tx.commit().await?;

        Ok(Volunteer {
            project_id,
            account_id,
            joined_at,
        })
    }

    async fn is_member(&self, project_id: Uuid, account_id: Uuid) -> Result<bool> {
        let query = Query::select()
            .expr(Expr::col(Volunteers::AccountId).count())
            .from(Volunteers::Table)
            .and_where(Expr::col(Volunteers::ProjectId).eq(project_id.to_string()))
            .and_where(Expr::col(Volunteers::AccountId).eq(account_id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>(0) > 0)
    }

    async fn volunteers(&self, project_id: Uuid) -> Result<Vec<Volunteer>> {
        let query = Query::select()
            .columns([
                Volunteers::ProjectId,
                Volunteers::AccountId,
                Volunteers::JoinedAt,
            ])
            .from(Volunteers::Table)
            .and_where(Expr::col(Volunteers::ProjectId).eq(project_id.to_string()))
            .order_by(Volunteers::JoinedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_volunteer).collect()
    }
}
