//! gRPC interface (`UserService`, no proto package)

pub mod proto;
pub mod service;
mod status;

pub use proto::user_service_client::UserServiceClient;
pub use proto::user_service_server::UserServiceServer;
pub use service::{UserGrpcService, AUTHORIZATION_METADATA};
