use std::time::Instant;

use axum::{extract::{Query, State}, http::StatusCode, Json};
use common::types::Message;
use serde::Deserialize;
use service::product::{CreateProductDto, Product, SeedSummary, UpdateAck, UpdateProductDto};
use tracing::info;
use uuid::Uuid;

use crate::{errors::JsonApiError, metrics, routes::AppState};

pub const DELETE_MESSAGE: &str = "Delete is successful!";

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Product id
    pub id: Uuid,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Search term matched against name, and typo-tolerantly against description
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SeedQuery {
    /// Number of demo products to write
    pub count: Option<usize>,
}

#[utoipa::path(
    post, path = "/products/create", tag = "products",
    request_body = crate::openapi::CreateProductDtoDoc,
    responses(
        (status = 200, description = "Created; body is the new id", body = Uuid),
        (status = 502, description = "Store Write Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn create(State(state): State<AppState>, Json(input): Json<CreateProductDto>) -> Result<Json<Uuid>, JsonApiError> {
    let started = Instant::now();
    let result = state.products.create(input).await;
    metrics::observe("create", started, &result);
    let id = result?;
    info!(%id, "created product");
    Ok(Json(id))
}

#[utoipa::path(
    put, path = "/products/update", tag = "products",
    request_body = crate::openapi::UpdateProductDtoDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::UpdateAckDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc),
        (status = 502, description = "Store Write Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn update(State(state): State<AppState>, Json(input): Json<UpdateProductDto>) -> Result<Json<UpdateAck>, JsonApiError> {
    let started = Instant::now();
    let result = state.products.update(input).await;
    metrics::observe("update", started, &result);
    let ack = result?;
    info!(id = %ack.id, result = %ack.result, "updated product");
    Ok(Json(ack))
}

#[utoipa::path(
    delete, path = "/products/deleteById", tag = "products",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::MessageDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc),
        (status = 502, description = "Store Write Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn delete_by_id(State(state): State<AppState>, Query(q): Query<DeleteQuery>) -> Result<Json<Message>, JsonApiError> {
    let started = Instant::now();
    let result = state.products.delete(q.id).await;
    metrics::observe("delete", started, &result);
    result?;
    info!(id = %q.id, "deleted product");
    Ok(Json(Message { message: DELETE_MESSAGE.to_string() }))
}

#[utoipa::path(
    get, path = "/products/getall", tag = "products",
    params(ListQuery),
    responses(
        (status = 200, description = "Up to 100 products sorted by name", body = [crate::openapi::ProductDoc]),
        (status = 502, description = "Store Query Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn get_all(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Result<Json<Vec<Product>>, JsonApiError> {
    let started = Instant::now();
    let result = state.products.list(q.q.as_deref()).await;
    metrics::observe("list", started, &result);
    let list = result?;
    info!(count = list.len(), term = ?q.q, "list products");
    Ok(Json(list))
}

#[utoipa::path(
    get, path = "/products/seeddata", tag = "products",
    params(SeedQuery),
    responses(
        (status = 201, description = "Seed run finished", body = crate::openapi::SeedSummaryDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn seed_data(State(state): State<AppState>, Query(q): Query<SeedQuery>) -> Result<(StatusCode, Json<SeedSummary>), JsonApiError> {
    let count = q.count.unwrap_or(state.seed_count);
    let started = Instant::now();
    let result = state.products.seed(count).await;
    metrics::observe("seed", started, &result);
    let summary = result?;
    metrics::SEEDED_DOCUMENTS_TOTAL.inc_by(summary.created as u64);
    info!(created = summary.created, failed = summary.failed, "seeded products");
    Ok((StatusCode::CREATED, Json(summary)))
}
