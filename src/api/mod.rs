//! REST API layer.

pub mod actor;
pub mod error;
mod handlers;
mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode};
pub use rest::router;
