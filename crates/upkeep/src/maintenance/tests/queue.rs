use chrono::{Duration, Utc};

use super::common::*;
use crate::maintenance::domain::{Role, Status, Urgency};
use crate::maintenance::queue::rank_by_urgency;
use crate::maintenance::service::MaintenanceError;
use crate::maintenance::store::{RequestFilter, RequestStore};

#[test]
fn urgency_rank_table() {
    assert_eq!(Urgency::Emergency.rank(), 0);
    assert_eq!(Urgency::High.rank(), 1);
    assert_eq!(Urgency::Medium.rank(), 2);
    assert_eq!(Urgency::Low.rank(), 3);
}

#[test]
fn queue_never_includes_completed_requests() {
    let harness = harness();
    let now = Utc::now();

    seed_request(
        &harness.store,
        &harness.accounts.tenant,
        &harness.accounts.worker,
        Urgency::Emergency,
        Status::Completed,
        now - Duration::hours(5),
        Some(now - Duration::hours(1)),
    );
    seed_request(
        &harness.store,
        &harness.accounts.tenant,
        &harness.accounts.worker,
        Urgency::Low,
        Status::Pending,
        now - Duration::hours(4),
        None,
    );

    let queue = harness
        .service
        .worker_queue(harness.accounts.worker.id)
        .expect("worker reads queue");

    assert_eq!(queue.len(), 1);
    assert!(queue.iter().all(|view| view.status != "Completed"));
}

#[test]
fn queue_groups_by_urgency_preserving_submission_order() {
    let harness = harness();
    let now = Utc::now();

    // Insertion order carries the tie-break: ids ascend with each seed.
    let urgencies = [
        Urgency::Low,
        Urgency::Emergency,
        Urgency::Medium,
        Urgency::High,
        Urgency::Emergency,
    ];
    let mut ids = Vec::new();
    for (index, urgency) in urgencies.into_iter().enumerate() {
        let record = seed_request(
            &harness.store,
            &harness.accounts.tenant,
            &harness.accounts.worker,
            urgency,
            Status::Pending,
            now - Duration::minutes(index as i64),
            None,
        );
        ids.push(record.id);
    }

    let queue = harness
        .service
        .worker_queue(harness.accounts.worker.id)
        .expect("worker reads queue");

    let ordered: Vec<_> = queue.iter().map(|view| view.id).collect();
    assert_eq!(ordered, vec![ids[1], ids[4], ids[3], ids[2], ids[0]]);
    assert_eq!(
        queue.iter().map(|view| view.urgency).collect::<Vec<_>>(),
        vec!["Emergency", "Emergency", "High", "Medium", "Low"]
    );
}

#[test]
fn queue_requires_the_worker_role() {
    let harness = harness();

    for actor in [&harness.accounts.tenant, &harness.accounts.manager] {
        match harness.service.worker_queue(actor.id) {
            Err(MaintenanceError::Forbidden { required }) => assert_eq!(required, Role::Worker),
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}

#[test]
fn ranking_is_stable_for_equal_urgency() {
    let harness = harness();
    let now = Utc::now();

    let first = seed_request(
        &harness.store,
        &harness.accounts.tenant,
        &harness.accounts.worker,
        Urgency::High,
        Status::Pending,
        now,
        None,
    );
    let second = seed_request(
        &harness.store,
        &harness.accounts.tenant,
        &harness.accounts.worker,
        Urgency::High,
        Status::InProgress,
        now,
        None,
    );

    let open = harness
        .store
        .list(RequestFilter::ExcludeStatus(Status::Completed))
        .expect("list open");
    let ranked = rank_by_urgency(open);

    assert_eq!(ranked[0].id, first.id);
    assert_eq!(ranked[1].id, second.id);
}
