//! HTTP REST API interfaces
//!
//! - `middleware`: bearer-token authentication
//! - `modules`: handlers grouped by resource (users, health, metrics)
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_router, ApiDoc, HttpState};
