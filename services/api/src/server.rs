use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingNotificationPublisher};
use crate::routes::with_housing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use reslife::config::AppConfig;
use reslife::error::AppError;
use reslife::housing::{HousingService, HousingStore};
use reslife::telemetry;
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

    // Structural rows arrive through the admin provisioning tool; the
    // engine starts with an empty inventory.
    let store = Arc::new(HousingStore::new());
    let notifier = Arc::new(LoggingNotificationPublisher);
    let housing_service = Arc::new(HousingService::new(store, notifier));

    let app = with_housing_routes(housing_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "housing allocation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
