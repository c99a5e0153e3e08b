use std::sync::Arc;

use clap::Args;
use upkeep::error::AppError;
use upkeep::maintenance::{MaintenanceService, SubmitRequest};

use crate::infra::{seed_accounts, seed_requests, InMemoryRequestStore, InMemoryUserDirectory};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only print the seeded queue and dashboard without walking a new
    /// request through the lifecycle
    #[arg(long)]
    pub(crate) seed_only: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryRequestStore::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let accounts = seed_accounts(directory.as_ref())?;
    let seeded = seed_requests(store.as_ref(), &accounts)?;
    let service = MaintenanceService::new(store, directory);

    println!("Building maintenance demo");
    println!("Seeded {seeded} requests across units 101-108");

    if !args.seed_only {
        println!("\nTenant submits a new emergency");
        let submission = SubmitRequest {
            unit_number: "107".to_string(),
            category: "Electrical".to_string(),
            urgency: "Emergency".to_string(),
            description: "Main panel smells like burning plastic".to_string(),
        };
        let record = match service.submit(accounts.tenant.id, submission) {
            Ok(record) => record,
            Err(err) => {
                println!("  Submission rejected: {err}");
                return Ok(());
            }
        };
        println!("- Request {} created as {}", record.id, record.status);

        let picked_up = match service.update_status(record.id, accounts.worker.id, "In Progress") {
            Ok(updated) => updated,
            Err(err) => {
                println!("  Update rejected: {err}");
                return Ok(());
            }
        };
        println!(
            "- Worker {} picked it up -> {}",
            accounts.worker.username, picked_up.status
        );

        let completed = match service.update_status(record.id, accounts.worker.id, "Completed") {
            Ok(updated) => updated,
            Err(err) => {
                println!("  Update rejected: {err}");
                return Ok(());
            }
        };
        if let Some(resolved_at) = completed.resolved_at {
            println!("- Completed at {resolved_at}");
        }

        match service.update_status(record.id, accounts.worker.id, "In Progress") {
            Err(err) => println!("- Re-opening is refused: {err}"),
            Ok(_) => println!("- Unexpectedly re-opened a completed request"),
        }
    }

    println!("\nWorker queue (most urgent first)");
    let queue = match service.worker_queue(accounts.worker.id) {
        Ok(queue) => queue,
        Err(err) => {
            println!("  Queue unavailable: {err}");
            return Ok(());
        }
    };
    for view in &queue {
        println!(
            "- {} [{}] {} in unit {} | {} | {}",
            view.id, view.urgency, view.category, view.unit_number, view.status, view.description
        );
    }

    println!("\nManager dashboard");
    let metrics = match service.manager_dashboard(accounts.manager.id) {
        Ok(metrics) => metrics,
        Err(err) => {
            println!("  Dashboard unavailable: {err}");
            return Ok(());
        }
    };
    println!(
        "- Open: {} | Completed: {} | Open emergencies: {}",
        metrics.open_count, metrics.completed_count, metrics.emergency_open_count
    );
    println!(
        "- Average resolution: {:.1} hours",
        metrics.avg_resolution_hours
    );
    println!("- Recent requests:");
    for view in &metrics.recent_requests {
        let worker_note = view
            .assigned_worker
            .as_deref()
            .map(|name| format!(" (assigned {name})"))
            .unwrap_or_default();
        println!(
            "  - {} unit {} [{}] {}{}",
            view.id, view.unit_number, view.urgency, view.status, worker_note
        );
    }

    Ok(())
}
