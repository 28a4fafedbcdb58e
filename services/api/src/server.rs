use crate::cli::ServeArgs;
use crate::infra::{AppState, ReferenceData};
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use loan_contract::config::AppConfig;
use loan_contract::error::AppError;
use loan_contract::telemetry;
use std::sync::atomic::Ordering;
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
    let reference = ReferenceData::load(&config.data)?;
    let app_state = AppState::new(&config, prometheus_handle, reference);
    let readiness_flag = app_state.readiness.clone();

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan contract service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
