use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use search::{DocumentStore, MemoryStore};
use serde_json::{json, Value};
use service::product::ProductService;
use tower::Service;
use uuid::Uuid;

use server::routes::{self, AppState};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

async fn build_app() -> anyhow::Result<Router> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let products = Arc::new(ProductService::new(store, "products"));
    products.ensure_index().await?;
    let state = AppState { products, seed_count: 100 };
    Ok(routes::build_router(state, cors()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&b)?))?,
        None => builder.body(Body::empty())?,
    };
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, json))
}

async fn create(app: &Router, name: &str, price: f64, stock: i32, description: &str) -> anyhow::Result<Uuid> {
    let (status, body) = send(
        app,
        "POST",
        "/products/create",
        Some(json!({"name": name, "price": price, "stock": stock, "description": description})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(serde_json::from_value(body)?)
}

#[tokio::test]
async fn test_health() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_create_then_search_by_term() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = create(&app, "Tomato Paste", 3.50, 10, "Canned tomato paste").await?;
    create(&app, "Olive Oil", 12.0, 4, "Cold pressed").await?;

    let (status, body) = send(&app, "GET", "/products/getall?q=tomato", None).await?;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.to_string());
    assert_eq!(items[0]["name"], "Tomato Paste");
    assert_eq!(items[0]["price"], 3.5);
    assert_eq!(items[0]["stock"], 10);
    Ok(())
}

#[tokio::test]
async fn test_getall_without_term_sorted_by_name() -> anyhow::Result<()> {
    let app = build_app().await?;
    create(&app, "Zucchini", 1.0, 1, "green").await?;
    create(&app, "Apple", 2.0, 2, "red").await?;
    create(&app, "Mango", 3.0, 3, "yellow").await?;

    let (status, body) = send(&app, "GET", "/products/getall", None).await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .map(|a| a.iter().filter_map(|p| p["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Apple", "Mango", "Zucchini"]);
    Ok(())
}

#[tokio::test]
async fn test_update_existing_and_missing() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = create(&app, "Old Name", 1.0, 1, "old").await?;

    let (status, body) = send(
        &app,
        "PUT",
        "/products/update",
        Some(json!({"id": id, "name": "New Name", "price": 2.25, "stock": 7, "description": "new"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());
    assert_eq!(body["result"], "updated");

    let (_, list) = send(&app, "GET", "/products/getall", None).await?;
    assert_eq!(list, json!([{"id": id, "name": "New Name", "price": 2.25, "stock": 7, "description": "new"}]));

    let (status, body) = send(
        &app,
        "PUT",
        "/products/update",
        Some(json!({"id": Uuid::new_v4(), "name": "x", "price": 1.0, "stock": 1, "description": "x"})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    Ok(())
}

#[tokio::test]
async fn test_delete_by_id() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = create(&app, "Short Lived", 1.0, 1, "gone soon").await?;

    let uri = format!("/products/deleteById?id={id}");
    let (status, body) = send(&app, "DELETE", &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Delete is successful!"}));

    let (_, list) = send(&app, "GET", "/products/getall", None).await?;
    assert_eq!(list, json!([]));

    let (status, _) = send(&app, "DELETE", &uri, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/products/deleteById?id=not-a-uuid", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_seed_data_creates_and_caps_listing() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, "GET", "/products/seeddata", None).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["requested"], 100);
    assert_eq!(body["created"], 100);
    assert_eq!(body["failed"], 0);

    let (status, _) = send(&app, "GET", "/products/seeddata?count=5", None).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = send(&app, "GET", "/products/getall", None).await?;
    let items = list.as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 100);
    for p in &items {
        let stock = p["stock"].as_i64().unwrap_or_default();
        assert!((1..=20).contains(&stock));
        let price = p["price"].as_f64().unwrap_or_default();
        assert!((1.0..=1000.0).contains(&price));
    }
    Ok(())
}

#[tokio::test]
async fn test_seed_data_rejects_zero_count() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, "GET", "/products/seeddata?count=0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    Ok(())
}

#[tokio::test]
async fn test_create_rejects_malformed_body() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, _) = send(&app, "POST", "/products/create", Some(json!({"name": "missing fields"}))).await?;
    assert!(status.is_client_error());
    Ok(())
}

#[tokio::test]
async fn test_metrics_and_openapi_exposed() -> anyhow::Result<()> {
    let app = build_app().await?;
    create(&app, "Counted", 1.0, 1, "metrics").await?;

    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(resp.into_body(), usize::MAX).await?.to_vec())?;
    assert!(text.contains("product_api_operations_total"));

    let (status, doc) = send(&app, "GET", "/api-docs/openapi.json", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/products/getall"].is_object());
    Ok(())
}
