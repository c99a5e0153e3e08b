use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use super::dashboard::{self, DashboardMetrics};
use super::domain::{
    Category, MaintenanceRequest, RequestId, Role, Status, TransitionError, Urgency, User, UserId,
};
use super::policy;
use super::queue;
use super::store::{
    NewRequest, RequestFilter, RequestStore, RequestView, StoreError, UpdateError, UserDirectory,
};

/// Inbound submission payload, as decoded by the calling layer. Category
/// and urgency arrive as text and are validated here.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub unit_number: String,
    pub category: String,
    pub urgency: String,
    pub description: String,
}

/// Service composing the access policy, store, and user directory.
pub struct MaintenanceService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

impl<S, D> MaintenanceService<S, D>
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    /// Create a Pending request on behalf of a tenant.
    pub fn submit(
        &self,
        tenant_id: UserId,
        submission: SubmitRequest,
    ) -> Result<MaintenanceRequest, MaintenanceError> {
        let tenant = self.acting_user(tenant_id)?;
        policy::require_role(&tenant, Role::Tenant)?;

        let (category, urgency) = validate_submission(&submission)?;
        let record = self.store.insert(NewRequest {
            tenant_id: tenant.id,
            unit_number: submission.unit_number,
            category,
            urgency,
            description: submission.description,
            status: Status::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            assigned_worker_id: None,
        })?;

        Ok(record)
    }

    /// Apply a worker's status change through the store's atomic update.
    pub fn update_status(
        &self,
        id: RequestId,
        worker_id: UserId,
        new_status: &str,
    ) -> Result<MaintenanceRequest, MaintenanceError> {
        let worker = self.acting_user(worker_id)?;
        policy::require_role(&worker, Role::Worker)?;

        let next = Status::parse(new_status)
            .ok_or_else(|| TransitionError::UnknownStatus(new_status.to_string()))?;

        let now = Utc::now();
        let updated = self
            .store
            .update(id, &|request| {
                request.apply_status_change(next, worker.id, now)
            })
            .map_err(|err| match err {
                UpdateError::Store(StoreError::NotFound) => MaintenanceError::RequestNotFound(id),
                UpdateError::Store(other) => MaintenanceError::Store(other),
                UpdateError::Transition(transition) => MaintenanceError::Transition(transition),
            })?;

        Ok(updated)
    }

    /// A tenant's own requests, newest first.
    pub fn my_requests(&self, tenant_id: UserId) -> Result<Vec<RequestView>, MaintenanceError> {
        let tenant = self.acting_user(tenant_id)?;
        policy::require_role(&tenant, Role::Tenant)?;

        let requests = self.store.list_by_tenant(tenant.id)?;
        self.views(&requests)
    }

    /// Open requests ranked for triage, most urgent first.
    pub fn worker_queue(&self, worker_id: UserId) -> Result<Vec<RequestView>, MaintenanceError> {
        let worker = self.acting_user(worker_id)?;
        policy::require_role(&worker, Role::Worker)?;

        let open = self
            .store
            .list(RequestFilter::ExcludeStatus(Status::Completed))?;
        self.views(&queue::rank_by_urgency(open))
    }

    /// Aggregate health metrics over the full request set.
    pub fn manager_dashboard(
        &self,
        manager_id: UserId,
    ) -> Result<DashboardMetrics, MaintenanceError> {
        let manager = self.acting_user(manager_id)?;
        policy::require_role(&manager, Role::Manager)?;

        let requests = self.store.list(RequestFilter::All)?;
        let totals = dashboard::totals(&requests);
        let recent_requests = dashboard::recent(&requests, dashboard::RECENT_REQUEST_LIMIT)
            .into_iter()
            .map(|request| self.request_view(request))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DashboardMetrics {
            open_count: totals.open_count,
            completed_count: totals.completed_count,
            emergency_open_count: totals.emergency_open_count,
            avg_resolution_hours: totals.avg_resolution_hours,
            recent_requests,
        })
    }

    /// Project a record into its wire view, resolving the worker's display
    /// name through the directory.
    pub fn request_view(
        &self,
        request: &MaintenanceRequest,
    ) -> Result<RequestView, MaintenanceError> {
        let assigned_worker = match request.assigned_worker_id {
            Some(worker_id) => self.directory.user(worker_id)?.map(|worker| worker.username),
            None => None,
        };
        Ok(RequestView::new(request, assigned_worker))
    }

    fn acting_user(&self, id: UserId) -> Result<User, MaintenanceError> {
        self.directory
            .user(id)?
            .ok_or(MaintenanceError::UserNotFound(id))
    }

    fn views(
        &self,
        requests: &[MaintenanceRequest],
    ) -> Result<Vec<RequestView>, MaintenanceError> {
        requests
            .iter()
            .map(|request| self.request_view(request))
            .collect()
    }
}

fn validate_submission(
    submission: &SubmitRequest,
) -> Result<(Category, Urgency), ValidationError> {
    let mut fields = Vec::new();

    if submission.unit_number.trim().is_empty() {
        fields.push("unit_number");
    }
    if submission.description.trim().is_empty() {
        fields.push("description");
    }

    let category = Category::parse(&submission.category);
    if category.is_none() {
        fields.push("category");
    }
    let urgency = Urgency::parse(&submission.urgency);
    if urgency.is_none() {
        fields.push("urgency");
    }

    match (category, urgency) {
        (Some(category), Some(urgency)) if fields.is_empty() => Ok((category, urgency)),
        _ => Err(ValidationError { fields }),
    }
}

/// Malformed submission input, naming every offending field so the caller
/// can re-render its form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid submission field(s): {}", .fields.join(", "))]
pub struct ValidationError {
    pub fields: Vec<&'static str>,
}

/// Error raised by the maintenance service.
#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    #[error("maintenance request {0} not found")]
    RequestNotFound(RequestId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("{required} role required")]
    Forbidden { required: Role },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
