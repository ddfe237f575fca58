use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ProductDoc {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub stock: i32,
    pub description: String,
}

#[derive(ToSchema)]
pub struct CreateProductDtoDoc { pub name: String, pub price: f64, pub stock: i32, pub description: String }

#[derive(ToSchema)]
pub struct UpdateProductDtoDoc { pub id: Uuid, pub name: String, pub price: f64, pub stock: i32, pub description: String }

#[derive(ToSchema)]
pub struct UpdateAckDoc {
    pub id: Uuid,
    /// `updated`, or `noop` when nothing changed
    pub result: String,
    pub version: Option<i64>,
}

#[derive(ToSchema)]
pub struct SeedSummaryDoc { pub requested: usize, pub created: usize, pub failed: usize, pub ids: Vec<Uuid> }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct ErrorBodyDoc { pub error: String, pub detail: Option<String> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::products::create,
        crate::routes::products::update,
        crate::routes::products::delete_by_id,
        crate::routes::products::get_all,
        crate::routes::products::seed_data,
    ),
    components(
        schemas(
            HealthResponse,
            ProductDoc,
            CreateProductDtoDoc,
            UpdateProductDtoDoc,
            UpdateAckDoc,
            SeedSummaryDoc,
            MessageDoc,
            ErrorBodyDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "products")
    )
)]
pub struct ApiDoc;
