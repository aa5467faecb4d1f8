use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_inspection_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use site_inspection::config::AppConfig;
use site_inspection::error::AppError;
use site_inspection::inspection::InspectionService;
use site_inspection::telemetry;
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

    let catalog = config.inspection.catalog()?;
    info!(
        sections = catalog.bank().sections().len(),
        locations = catalog.locations.len(),
        "inspection catalog loaded"
    );
    let inspection_service = Arc::new(InspectionService::new(Arc::new(catalog)));

    let app = with_inspection_routes(inspection_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "site inspection service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
