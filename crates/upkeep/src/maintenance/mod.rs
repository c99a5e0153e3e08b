//! Maintenance request tracking: lifecycle transitions, the urgency-ranked
//! worker queue, and the manager dashboard aggregates.
//!
//! Storage sits behind the traits in [`store`] so the engine can run
//! against the in-memory implementations used by the service binary and by
//! tests alike. All operations are synchronous request/response; the only
//! mutation path is the store's per-record atomic update.

pub(crate) mod dashboard;
pub mod domain;
pub(crate) mod policy;
pub(crate) mod queue;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use dashboard::DashboardMetrics;
pub use domain::{
    Category, MaintenanceRequest, RequestId, Role, Status, TransitionError, Urgency, User, UserId,
};
pub use policy::authorize;
pub use router::maintenance_router;
pub use service::{MaintenanceError, MaintenanceService, SubmitRequest, ValidationError};
pub use store::{
    NewRequest, NewUser, RequestFilter, RequestStore, RequestView, StoreError, UpdateError,
    UserDirectory,
};
