//! Product module: domain types, demo-data generator and the store-backed service.

pub mod domain;
pub mod seed;
pub mod service;

pub use domain::{CreateProductDto, Product, SeedSummary, UpdateAck, UpdateProductDto};
pub use service::ProductService;
