//! Shared building blocks for the workspace: logging setup and response bodies.

pub mod types;
pub mod utils;
