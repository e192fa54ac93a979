//! Community project persistence interface.

use async_trait::async_trait;
use uuid::Uuid;

use super::ledger_store::Result;
use crate::domain::{CommunityProject, LedgerPosting, NewProject, Volunteer};

/// Interface for community project persistence and volunteer membership.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a new active project created by `creator_id`.
    async fn create(&self, creator_id: Uuid, project: NewProject) -> Result<CommunityProject>;

    /// Fetch a project by id.
    async fn get(&self, id: Uuid) -> Result<CommunityProject>;

    /// Active projects, newest first.
    async fn list_active(&self) -> Result<Vec<CommunityProject>>;

    /// Insert the volunteer row and apply the join reward in one
    /// transaction. The capacity check happens inside the same transaction:
    /// an insert that would exceed `max_volunteers` rolls back with
    /// `CapacityExceeded`, a repeated join fails with `AlreadyJoined`, and
    /// in both cases nothing is paid.
    async fn join_rewarded(
        &self,
        project_id: Uuid,
        account_id: Uuid,
        reward: LedgerPosting,
    ) -> Result<Volunteer>;

    /// Whether an account has joined a project.
    async fn is_member(&self, project_id: Uuid, account_id: Uuid) -> Result<bool>;

    /// Volunteer rows for a project, oldest first.
    async fn volunteers(&self, project_id: Uuid) -> Result<Vec<Volunteer>>;
}
