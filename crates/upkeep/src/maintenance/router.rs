use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{RequestId, UserId};
use super::service::{MaintenanceError, MaintenanceService, SubmitRequest};
use super::store::{RequestStore, UserDirectory};

/// Router builder exposing the JSON endpoints of the request workflow.
///
/// Acting identities arrive as explicit ids (authentication belongs to the
/// calling layer) and are resolved against the user directory before any
/// operation runs.
pub fn maintenance_router<S, D>(service: Arc<MaintenanceService<S, D>>) -> Router
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    Router::new()
        .route("/api/v1/maintenance/requests", post(submit_handler::<S, D>))
        .route(
            "/api/v1/maintenance/requests/:request_id/status",
            post(update_status_handler::<S, D>),
        )
        .route(
            "/api/v1/maintenance/tenants/:tenant_id/requests",
            get(my_requests_handler::<S, D>),
        )
        .route(
            "/api/v1/maintenance/workers/:worker_id/queue",
            get(queue_handler::<S, D>),
        )
        .route(
            "/api/v1/maintenance/managers/:manager_id/dashboard",
            get(dashboard_handler::<S, D>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitBody {
    pub(crate) tenant_id: u64,
    pub(crate) unit_number: String,
    pub(crate) category: String,
    pub(crate) urgency: String,
    pub(crate) description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    pub(crate) worker_id: u64,
    pub(crate) status: String,
}

pub(crate) async fn submit_handler<S, D>(
    State(service): State<Arc<MaintenanceService<S, D>>>,
    axum::Json(body): axum::Json<SubmitBody>,
) -> Response
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    let SubmitBody {
        tenant_id,
        unit_number,
        category,
        urgency,
        description,
    } = body;

    let submission = SubmitRequest {
        unit_number,
        category,
        urgency,
        description,
    };

    let record = match service.submit(UserId(tenant_id), submission) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match service.request_view(&record) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_status_handler<S, D>(
    State(service): State<Arc<MaintenanceService<S, D>>>,
    Path(request_id): Path<u64>,
    axum::Json(body): axum::Json<StatusBody>,
) -> Response
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    let updated = match service.update_status(
        RequestId(request_id),
        UserId(body.worker_id),
        &body.status,
    ) {
        Ok(updated) => updated,
        Err(error) => return error_response(error),
    };

    match service.request_view(&updated) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn my_requests_handler<S, D>(
    State(service): State<Arc<MaintenanceService<S, D>>>,
    Path(tenant_id): Path<u64>,
) -> Response
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    match service.my_requests(UserId(tenant_id)) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<S, D>(
    State(service): State<Arc<MaintenanceService<S, D>>>,
    Path(worker_id): Path<u64>,
) -> Response
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    match service.worker_queue(UserId(worker_id)) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dashboard_handler<S, D>(
    State(service): State<Arc<MaintenanceService<S, D>>>,
    Path(manager_id): Path<u64>,
) -> Response
where
    S: RequestStore + 'static,
    D: UserDirectory + 'static,
{
    match service.manager_dashboard(UserId(manager_id)) {
        Ok(metrics) => (StatusCode::OK, axum::Json(metrics)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: MaintenanceError) -> Response {
    let status = match &error {
        MaintenanceError::RequestNotFound(_) | MaintenanceError::UserNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        MaintenanceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        MaintenanceError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MaintenanceError::Transition(_) => StatusCode::CONFLICT,
        MaintenanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = match &error {
        MaintenanceError::Invalid(invalid) => json!({
            "error": error.to_string(),
            "fields": invalid.fields,
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
