//! Service layer shaping product operations onto the document store.
//! - Builds one store request per operation and maps responses to typed results.
//! - Holds no state between calls; the store client is injected.
//! - Seeds demo products through the same create path as the API.

pub mod errors;
pub mod product;
