use crate::cli::ServeArgs;
use crate::infra::{build_service, load_selections, AppState};
use crate::routes::with_eligibility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use recruit_ops::config::AppConfig;
use recruit_ops::error::AppError;
use recruit_ops::telemetry;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let eligibility_service = Arc::new(build_service(config.eligibility.clone()));
    if let Some(path) = args.selections.take() {
        let selections = load_selections(&path)?;
        eligibility_service.import_selections(&selections)?;
    }

    let app = with_eligibility_routes(eligibility_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        decline_threshold = config.eligibility.decline_threshold,
        default_block_months = config.eligibility.default_block_duration.months(),
        "internal team eligibility service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
