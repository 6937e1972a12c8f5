use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryIntervenantRepository};
use crate::routes::with_availability_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use intervenant_availability::config::AppConfig;
use intervenant_availability::error::AppError;
use intervenant_availability::telemetry;
use intervenant_availability::workflows::availability::{
    AvailabilityService, AvailabilityServiceError,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let engagement = config.availability.engagement()?;
    let calendar = config.availability.workweek_calendar()?;
    let repository =
        InMemoryIntervenantRepository::from_seed(config.availability.seed_path.as_deref())?;
    let records = repository
        .record_count()
        .map_err(AvailabilityServiceError::from)?;
    info!(
        records,
        weeks = engagement.weeks().len(),
        "intervenant records loaded"
    );

    let availability_service = Arc::new(AvailabilityService::new(
        Arc::new(repository),
        Arc::new(calendar),
        engagement,
    ));

    let app = with_availability_routes(availability_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "intervenant availability service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
