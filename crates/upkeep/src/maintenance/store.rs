use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Category, MaintenanceRequest, RequestId, Role, Status, TransitionError, Urgency, User, UserId,
};

/// Insert payload for a maintenance request; the store assigns the id.
///
/// The payload is deliberately general (any status, any timestamps) so seed
/// and demo data can be loaded directly. The lifecycle rules bind the
/// service operations, not the storage contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    pub tenant_id: UserId,
    pub unit_number: String,
    pub category: Category,
    pub urgency: Urgency,
    pub description: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assigned_worker_id: Option<UserId>,
}

/// Insert payload for a user account; the directory assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Which slice of the request collection a `list` call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFilter {
    All,
    ExcludeStatus(Status),
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait RequestStore: Send + Sync {
    fn insert(&self, request: NewRequest) -> Result<MaintenanceRequest, StoreError>;
    fn get(&self, id: RequestId) -> Result<Option<MaintenanceRequest>, StoreError>;
    /// Results are ordered by id ascending so downstream ranking and
    /// aggregation are reproducible.
    fn list(&self, filter: RequestFilter) -> Result<Vec<MaintenanceRequest>, StoreError>;
    /// A tenant's own requests, newest first.
    fn list_by_tenant(&self, tenant_id: UserId) -> Result<Vec<MaintenanceRequest>, StoreError>;
    /// Read-modify-write a single record in one critical section.
    ///
    /// Implementations must not let two concurrent updates to the same id
    /// interleave field writes: the closure runs exactly once against the
    /// current record, and either every field it wrote is visible
    /// afterwards or (on error) none are.
    fn update(
        &self,
        id: RequestId,
        apply: &dyn Fn(&mut MaintenanceRequest) -> Result<(), TransitionError>,
    ) -> Result<MaintenanceRequest, UpdateError>;
}

/// Account lookup for resolving acting identities and display names.
pub trait UserDirectory: Send + Sync {
    /// Usernames are unique; inserting a duplicate is a `Conflict`.
    fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
}

/// Failure of an atomic status update: either the record could not be
/// located or the requested transition was rejected.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Wire-facing projection of a request for role-scoped listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestView {
    pub id: RequestId,
    pub unit_number: String,
    pub category: &'static str,
    pub urgency: &'static str,
    pub description: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_worker: Option<String>,
}

impl RequestView {
    pub fn new(request: &MaintenanceRequest, assigned_worker: Option<String>) -> Self {
        Self {
            id: request.id,
            unit_number: request.unit_number.clone(),
            category: request.category.label(),
            urgency: request.urgency.label(),
            description: request.description.clone(),
            status: request.status.label(),
            created_at: request.created_at,
            resolved_at: request.resolved_at,
            assigned_worker,
        }
    }
}
