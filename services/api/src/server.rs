use crate::cli::ServeArgs;
use crate::infra::{build_rating_service, AppState};
use crate::routes::with_rating_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rope_safety::config::AppConfig;
use rope_safety::error::AppError;
use rope_safety::ratings::{recompute_queue, run_retry_worker};
use rope_safety::telemetry;
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

    let (retry_sender, retry_receiver) = recompute_queue();
    let rating_service =
        Arc::new(build_rating_service(config.rating).with_retry_queue(retry_sender));
    tokio::spawn(run_retry_worker(rating_service.clone(), retry_receiver));

    let app = with_rating_routes(rating_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        empty_inspections = config.rating.empty_inspections.label(),
        empty_quizzes = config.rating.empty_quizzes.label(),
        "safety rating service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
