//! Transport adapters over the account service
//!
//! - `http`: REST API (axum) with Swagger UI
//! - `grpc`: `UserService` RPCs (tonic)

pub mod grpc;
pub mod http;
