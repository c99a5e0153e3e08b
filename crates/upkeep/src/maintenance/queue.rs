use super::domain::MaintenanceRequest;

/// Order open requests for the worker queue.
///
/// Primary key is the urgency rank (Emergency=0, High=1, Medium=2, Low=3).
/// The sort is stable, so requests of equal urgency keep the store's
/// id-ascending retrieval order; no secondary key is imposed.
pub(crate) fn rank_by_urgency(mut requests: Vec<MaintenanceRequest>) -> Vec<MaintenanceRequest> {
    requests.sort_by_key(|request| request.urgency.rank());
    requests
}
