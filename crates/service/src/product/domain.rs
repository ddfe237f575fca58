use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product document as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub stock: i32,
    pub description: String,
}

impl Product {
    /// New product with a freshly generated id.
    pub fn create(input: CreateProductDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            price: input.price,
            stock: input.stock,
            description: input.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductDto {
    pub name: String,
    pub price: f64,
    pub stock: i32,
    pub description: String,
}

/// Full replacement field set for an existing product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductDto {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub stock: i32,
    pub description: String,
}

/// Store acknowledgement for an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAck {
    pub id: Uuid,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

/// Outcome of a seed run. Failed writes are counted, not retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub requested: usize,
    pub created: usize,
    pub failed: usize,
    pub ids: Vec<Uuid>,
}
