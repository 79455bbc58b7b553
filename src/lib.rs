//! # BitBridge User Service
//!
//! User identity microservice: registers accounts (bcrypt-hashed
//! credentials, unique email and username) and resolves an opaque
//! identifier (object id, email or username) to a public or private
//! account view, over both REST and gRPC.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: accounts, object ids, identifier classification, ports
//! - **application**: the `AccountService` use cases
//! - **infrastructure**: SeaORM persistence, in-memory storage, bcrypt
//! - **auth**: bearer-token verification shared by both transports
//! - **interfaces**: HTTP (axum + Swagger) and gRPC (tonic) adapters
//! - **server**: process bootstrap and listener supervision

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{AccountService, SharedAccountService};
pub use domain::{Account, DomainError, DomainResult, IdentifierKind, ObjectId, PublicAccount};
pub use infrastructure::{init_database, DatabaseConfig};
pub use interfaces::http::create_router;
pub use server::{init_tracing, ServerError, ServerHandle, ServerOptions};
