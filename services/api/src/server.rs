use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;
use upkeep::config::AppConfig;
use upkeep::error::AppError;
use upkeep::maintenance::MaintenanceService;
use upkeep::telemetry;

use crate::cli::ServeArgs;
use crate::infra::{
    seed_accounts, seed_requests, AppState, InMemoryRequestStore, InMemoryUserDirectory,
};
use crate::routes::with_maintenance_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryRequestStore::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let accounts = seed_accounts(directory.as_ref())?;
    let seeded = seed_requests(store.as_ref(), &accounts)?;
    let service = Arc::new(MaintenanceService::new(store, directory));

    let app = with_maintenance_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, seeded, "maintenance request service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
