//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bitbridge_user::auth::{create_token, JwtConfig};
use bitbridge_user::config::AppConfig;
use bitbridge_user::domain::AccountRepository;
use bitbridge_user::infrastructure::database::migrator::Migrator;
use bitbridge_user::infrastructure::{
    init_database, BcryptHasher, DatabaseConfig, InMemoryAccountRepository,
    SeaOrmAccountRepository,
};
use bitbridge_user::{AccountService, SharedAccountService};
use sea_orm_migration::MigratorTrait;

pub const JWT_SECRET: &str = "integration-secret";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: JWT_SECRET.to_string(),
        expiration_hours: 1,
        issuer: "bitbridge".to_string(),
    }
}

pub fn bearer() -> String {
    format!("Bearer {}", create_token("svc-gateway", "gateway", &jwt_config()).unwrap())
}

/// Service over a freshly migrated in-memory SQLite database.
pub async fn sqlite_service() -> SharedAccountService {
    let db = init_database(&DatabaseConfig::sqlite_in_memory()).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let repo: Arc<dyn AccountRepository> = Arc::new(SeaOrmAccountRepository::new(db));
    Arc::new(AccountService::new(repo, Arc::new(BcryptHasher::new(4))))
}

pub fn memory_service() -> SharedAccountService {
    let repo: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
    Arc::new(AccountService::new(repo, Arc::new(BcryptHasher::new(4))))
}

/// Loopback config on ephemeral ports with in-memory storage.
pub fn server_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "memory".to_string();
    config.server.http_host = "127.0.0.1".to_string();
    config.server.http_port = 0;
    config.server.grpc_host = "127.0.0.1".to_string();
    config.server.grpc_port = 0;
    config.server.shutdown_timeout = 5;
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.security.jwt_issuer = "bitbridge".to_string();
    config.security.bcrypt_cost = 4;
    config
}
