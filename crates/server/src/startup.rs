use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging;
use configs::{AppConfig, SearchBackend, SearchConfig, ServerConfig};
use dotenvy::dotenv;
use search::{DocumentStore, ElasticsearchOptions, ElasticsearchStore, MemoryStore, Refresh};
use service::product::service::MAX_SEED_COUNT;
use service::product::ProductService;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", server.host, server.port).parse()?)
}

/// Construct the process-wide store client for the configured backend.
pub fn build_store(cfg: &SearchConfig) -> Result<Arc<dyn DocumentStore>, StartupError> {
    match cfg.backend {
        SearchBackend::Memory => {
            warn!("using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        SearchBackend::Elasticsearch => {
            let refresh: Refresh = cfg
                .refresh
                .parse()
                .map_err(|e: search::StoreError| StartupError::InvalidConfig(e.to_string()))?;
            let opts = ElasticsearchOptions {
                url: cfg.url.clone(),
                username: cfg.username.clone(),
                password: cfg.password.clone(),
                timeout: Duration::from_secs(cfg.timeout_secs),
                refresh,
            };
            let store = ElasticsearchStore::connect(opts)
                .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
            info!(url = %cfg.url, "elasticsearch client configured");
            Ok(Arc::new(store))
        }
    }
}

/// Build the shared state: store client, product service, index bootstrap.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    if cfg.seed.count > MAX_SEED_COUNT {
        return Err(StartupError::InvalidConfig(format!("seed.count must be at most {MAX_SEED_COUNT}")));
    }
    let store = build_store(&cfg.search)?;
    store
        .ping()
        .await
        .map_err(|e| StartupError::Runtime(format!("document store unreachable: {e}")))?;
    let products = Arc::new(ProductService::new(store, cfg.search.index.clone()));
    products
        .ensure_index()
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    Ok(AppState { products, seed_count: cfg.seed.count })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    init_logging(cfg.log.json);

    let state = build_state(&cfg).await?;

    // Build router
    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr = bind_addr(&cfg.server)?;
    info!(%addr, index = %cfg.search.index, "starting product search api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
