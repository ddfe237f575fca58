use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use search::DocumentStore;
use service::product::ProductService;

use crate::metrics;
use crate::openapi::ApiDoc;

pub mod products;

/// Shared handler state; the service owns the process-wide store client.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService<dyn DocumentStore>>,
    /// Documents written by `/products/seeddata` when no `count` is given.
    pub seed_count: usize,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics_handler() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Build the full application router: product endpoints, health, metrics and API docs.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler));

    let product_routes = Router::new()
        .route("/products/create", post(products::create))
        .route("/products/update", put(products::update))
        .route("/products/deleteById", delete(products::delete_by_id))
        .route("/products/getall", get(products::get_all))
        .route("/products/seeddata", get(products::seed_data));

    public
        .merge(product_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
