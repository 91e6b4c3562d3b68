use crate::cli::ServeArgs;
use crate::infra::{
    seed_registry, AppState, InMemoryApplicationRepository, InMemoryRegistrationRepository,
};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use engineer_registry::config::AppConfig;
use engineer_registry::error::AppError;
use engineer_registry::telemetry;
use engineer_registry::workflows::registration::RegistryService;
use engineer_registry::workflows::review::{EvaluationConfig, ReviewService};
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

    let review_service = Arc::new(
        ReviewService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            EvaluationConfig::from(&config.review),
        )
        .with_page_size(config.review.page_size),
    );
    let registry_service = RegistryService::new(Arc::new(InMemoryRegistrationRepository::default()))
        .with_max_renewal_years(config.review.max_renewal_years)
        .with_page_size(config.review.page_size);
    let seeded = seed_registry(&registry_service)?;
    info!(records = seeded.len(), "register seeded");

    let app = with_workflow_routes(
        review_service,
        Arc::new(registry_service),
        config.review.default_locale,
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "engineer registry ready");

    axum::serve(listener, app).await?;
    Ok(())
}
