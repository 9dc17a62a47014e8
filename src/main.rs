pub mod api;
pub mod config;
pub mod data_structures;

use crate::data_structures::{RequestLimits, SharedRequestLimits, SharedSummaryService};
use anyhow::Context;
use axum::{Router, extract::FromRef, http::Method};
use equitywatch::services::{CsvDirectorySource, StockSummaryService};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    service: SharedSummaryService,
    limits: SharedRequestLimits,
}

impl AppState {
    pub fn new(service: SharedSummaryService, limits: SharedRequestLimits) -> Self {
        Self { service, limits }
    }
}

impl FromRef<AppState> for SharedSummaryService {
    fn from_ref(app_state: &AppState) -> SharedSummaryService {
        app_state.service.clone()
    }
}

impl FromRef<AppState> for SharedRequestLimits {
    fn from_ref(app_state: &AppState) -> SharedRequestLimits {
        app_state.limits.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::AppConfig::load()?;

    // Initialize tracing with node_name in all logs
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting equitywatch-proxy");
    tracing::info!(
        ?app_config.environment,
        port = app_config.port,
        data_dir = %app_config.data_dir.display(),
        symbols = ?app_config.catalog.symbols(),
        "Loaded configuration"
    );

    for symbol in app_config.catalog.symbols() {
        if let Ok((_, location)) = app_config.catalog.resolve(&symbol) {
            let path = app_config.data_dir.join(location);
            if !path.is_file() {
                tracing::warn!(symbol, path = %path.display(), "Price file missing; requests for this symbol will fail");
            }
        }
    }

    let source = CsvDirectorySource::new(&app_config.data_dir);
    let shared_service: SharedSummaryService = Arc::new(
        StockSummaryService::new(app_config.catalog.clone(), Arc::new(source))
            .with_read_timeout(app_config.read_timeout),
    );
    let shared_limits: SharedRequestLimits = Arc::new(RequestLimits::from_config(&app_config));

    let app_state = AppState::new(shared_service, shared_limits);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(app_config.rate_limit_per_second)
            .burst_size(app_config.rate_limit_burst)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]);

    let app = Router::new()
        .merge(api::stock_routes().layer(GovernorLayer::new(governor_conf)))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")?;

    Ok(())
}
