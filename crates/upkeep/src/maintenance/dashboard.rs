use serde::Serialize;

use super::domain::{MaintenanceRequest, Urgency};
use super::store::RequestView;

/// How many of the newest requests the dashboard lists.
pub(crate) const RECENT_REQUEST_LIMIT: usize = 10;

/// Aggregate health metrics for the manager dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub open_count: usize,
    pub completed_count: usize,
    pub emergency_open_count: usize,
    pub avg_resolution_hours: f64,
    pub recent_requests: Vec<RequestView>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DashboardTotals {
    pub(crate) open_count: usize,
    pub(crate) completed_count: usize,
    pub(crate) emergency_open_count: usize,
    pub(crate) avg_resolution_hours: f64,
}

/// Compute the dashboard counters over the full request set.
///
/// The average resolution time covers Completed requests that carry both
/// timestamps, reported in hours rounded to one decimal (half up), and is
/// an explicit 0.0 when nothing has been resolved yet.
pub(crate) fn totals(requests: &[MaintenanceRequest]) -> DashboardTotals {
    let mut open_count = 0;
    let mut completed_count = 0;
    let mut emergency_open_count = 0;
    let mut resolution_hours = 0.0;
    let mut resolved = 0u32;

    for request in requests {
        if request.is_open() {
            open_count += 1;
            if matches!(request.urgency, Urgency::Emergency) {
                emergency_open_count += 1;
            }
            continue;
        }

        completed_count += 1;
        if let Some(resolved_at) = request.resolved_at {
            let elapsed = resolved_at - request.created_at;
            resolution_hours += elapsed.num_seconds() as f64 / 3600.0;
            resolved += 1;
        }
    }

    let avg_resolution_hours = if resolved == 0 {
        0.0
    } else {
        round_to_tenth(resolution_hours / f64::from(resolved))
    };

    DashboardTotals {
        open_count,
        completed_count,
        emergency_open_count,
        avg_resolution_hours,
    }
}

/// The `limit` most recently created requests, newest first. Ties on the
/// creation timestamp fall back to the higher id so the result is stable.
pub(crate) fn recent(requests: &[MaintenanceRequest], limit: usize) -> Vec<&MaintenanceRequest> {
    let mut rows: Vec<&MaintenanceRequest> = requests.iter().collect();
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    rows.truncate(limit);
    rows
}

fn round_to_tenth(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}
