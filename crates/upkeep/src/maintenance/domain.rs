use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for maintenance requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The three fixed roles of the workflow. Parsed once at the boundary;
/// never compared as raw text inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tenant,
    Worker,
    Manager,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Worker => "worker",
            Role::Manager => "manager",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tenant" => Some(Role::Tenant),
            "worker" => Some(Role::Worker),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An authenticated actor. The credential hash is opaque here; verifying it
/// belongs to the calling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub const fn is_tenant(&self) -> bool {
        matches!(self.role, Role::Tenant)
    }

    pub const fn is_worker(&self) -> bool {
        matches!(self.role, Role::Worker)
    }

    pub const fn is_manager(&self) -> bool {
        matches!(self.role, Role::Manager)
    }
}

/// Recognized maintenance categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Plumbing,
    Electrical,
    Hvac,
    General,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Category::Plumbing => "Plumbing",
            Category::Electrical => "Electrical",
            Category::Hvac => "HVAC",
            Category::General => "General",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plumbing" => Some(Category::Plumbing),
            "electrical" => Some(Category::Electrical),
            "hvac" => Some(Category::Hvac),
            "general" => Some(Category::General),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How urgently a request needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::Emergency => "Emergency",
        }
    }

    /// Queue priority: Emergency=0, High=1, Medium=2, Low=3. Lower ranks
    /// sort first in the worker queue.
    pub const fn rank(self) -> u8 {
        match self {
            Urgency::Emergency => 0,
            Urgency::High => 1,
            Urgency::Medium => 2,
            Urgency::Low => 3,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            "emergency" => Some(Urgency::Emergency),
            _ => None,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl Status {
    pub const fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "in progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    /// The transition table. A Pending request may be picked up or closed
    /// outright; an In Progress request may be closed or re-marked (which
    /// reassigns it). Completed is terminal, and Pending is never a valid
    /// target.
    pub const fn permits(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::InProgress | Status::Completed)
                | (Status::InProgress, Status::InProgress | Status::Completed)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("unknown status '{0}'")]
    UnknownStatus(String),
    #[error("a {from} request cannot move to {to}")]
    NotAllowed { from: Status, to: Status },
}

/// A tenant-reported maintenance issue and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
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

impl MaintenanceRequest {
    pub const fn is_open(&self) -> bool {
        !matches!(self.status, Status::Completed)
    }

    /// Apply a worker's status change in place.
    ///
    /// Validates against the transition table before touching any field, so
    /// a rejected change leaves the record untouched. On success the acting
    /// worker takes (or keeps) the assignment, and `resolved_at` is stamped
    /// exactly when the request first reaches Completed; it is never
    /// cleared afterwards.
    pub fn apply_status_change(
        &mut self,
        next: Status,
        worker: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.status.permits(next) {
            return Err(TransitionError::NotAllowed {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.assigned_worker_id = Some(worker);
        if matches!(next, Status::Completed) && self.resolved_at.is_none() {
            self.resolved_at = Some(now);
        }

        Ok(())
    }
}
