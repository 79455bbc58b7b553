//! Reusable user-service runtime.
//!
//! [`ServerHandle`] owns the whole process lifecycle: storage init,
//! migrations, the HTTP and gRPC listeners, metrics and graceful shutdown.
//! The two listeners are supervised together: if either one stops on its
//! own, the other is shut down and [`ServerHandle::wait`] reports an error.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tracing::{error, info, warn};

use crate::application::{AccountService, SharedAccountService};
use crate::auth::{JwtAccessVerifier, SharedAccessVerifier};
use crate::config::{AppConfig, ConfigError};
use crate::domain::AccountRepository;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{
    init_database, BcryptHasher, InMemoryAccountRepository, SeaOrmAccountRepository,
};
use crate::interfaces::grpc::{UserGrpcService, UserServiceServer};
use crate::interfaces::http::{create_router, HttpState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        listener: &'static str,
        addr: String,
        source: std::io::Error,
    },

    #[error("Metrics recorder unavailable: {0}")]
    Metrics(String),

    #[error("{listener} listener failed: {reason}")]
    ListenerFailed {
        listener: &'static str,
        reason: String,
    },

    #[error("{0} listener stopped unexpectedly")]
    ListenerExited(&'static str),
}

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations (table + unique indexes) on startup.
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Listener {
    Http,
    Grpc,
}

impl Listener {
    fn name(self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Grpc => "gRPC",
        }
    }
}

type ListenerTask = JoinHandle<Result<(), String>>;

/// Handle to a running user service.
///
/// ```rust,no_run
/// use bitbridge_user::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await?;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub config: AppConfig,
    pub accounts: SharedAccountService,
    /// Bound HTTP address (resolves port 0).
    pub http_addr: SocketAddr,
    /// Bound gRPC address (resolves port 0).
    pub grpc_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    http_task: ListenerTask,
    grpc_task: ListenerTask,
}

impl ServerHandle {
    /// Start both listeners.
    ///
    /// 1. Validate configuration and install the Prometheus recorder
    /// 2. Open storage (SQL database or in-memory) and run migrations
    /// 3. Bind the HTTP and gRPC listeners
    /// 4. Spawn both servers on a shared shutdown signal
    pub async fn start(opts: ServerOptions) -> Result<Self, ServerError> {
        let config = opts.config;
        config.validate()?;

        info!("Starting BitBridge user service...");

        let prometheus = prometheus_handle()?;

        // ── Storage ────────────────────────────────────────────
        let (repo, db): (Arc<dyn AccountRepository>, Option<DatabaseConnection>) =
            if config.database.is_memory() {
                warn!("Using in-memory account storage; data is lost on exit");
                (Arc::new(InMemoryAccountRepository::new()), None)
            } else {
                let db = init_database(&config.database.to_database_config()).await?;
                if opts.auto_migrate {
                    info!("Running database migrations...");
                    Migrator::up(&db, None).await?;
                    info!("Migrations completed");
                }
                (Arc::new(SeaOrmAccountRepository::new(db.clone())), Some(db))
            };

        // ── Services ───────────────────────────────────────────
        let hasher = Arc::new(BcryptHasher::new(config.security.bcrypt_cost));
        let accounts: SharedAccountService = Arc::new(AccountService::new(repo, hasher));
        let verifier: SharedAccessVerifier =
            Arc::new(JwtAccessVerifier::new(config.security.jwt_config()));

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let signal = shutdown.signal();

        // ── Listeners ──────────────────────────────────────────
        let http_listener = bind(Listener::Http, &config.server.http_addr()).await?;
        let grpc_listener = bind(Listener::Grpc, &config.server.grpc_addr()).await?;
        let http_addr = local_addr(Listener::Http, &http_listener)?;
        let grpc_addr = local_addr(Listener::Grpc, &grpc_listener)?;

        let router = create_router(HttpState {
            accounts: accounts.clone(),
            verifier: verifier.clone(),
            prometheus,
        });
        let http_shutdown = signal.clone();
        let http_task = tokio::spawn(async move {
            axum::serve(
                http_listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                http_shutdown.wait().await;
                info!("🛑 HTTP server received shutdown signal");
            })
            .await
            .map_err(|e| e.to_string())
        });
        info!("HTTP API listening on http://{}", http_addr);
        info!("Swagger UI available at http://{}/docs/", http_addr);

        let grpc_service = UserServiceServer::new(UserGrpcService::new(accounts.clone(), verifier));
        let grpc_shutdown = signal.clone();
        let grpc_task = tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(grpc_service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(grpc_listener), async move {
                    grpc_shutdown.wait().await;
                    info!("🛑 gRPC server received shutdown signal");
                })
                .await
                .map_err(|e| e.to_string())
        });
        info!("gRPC server listening on {}", grpc_addr);

        info!("🚀 All servers started.");

        Ok(Self {
            config,
            accounts,
            http_addr,
            grpc_addr,
            db,
            shutdown,
            http_task,
            grpc_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGTERM / SIGINT.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking). Follow with [`wait`](Self::wait).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    pub fn is_running(&self) -> bool {
        !self.http_task.is_finished() && !self.grpc_task.is_finished()
    }

    /// Block until the service stops.
    ///
    /// Returns `Ok` only for a requested shutdown. A listener that stopped
    /// on its own (error, panic or clean exit) takes the other one down and
    /// is reported as an error.
    pub async fn wait(self) -> Result<(), ServerError> {
        let Self {
            db,
            shutdown,
            mut http_task,
            mut grpc_task,
            ..
        } = self;
        let signal = shutdown.signal();

        let (first, outcome) = tokio::select! {
            res = &mut http_task => (Listener::Http, join_outcome(res)),
            res = &mut grpc_task => (Listener::Grpc, join_outcome(res)),
        };

        let requested = signal.is_triggered();
        match &outcome {
            Ok(()) if requested => info!("{} server stopped", first.name()),
            Ok(()) => error!("{} server stopped unexpectedly", first.name()),
            Err(reason) => error!("{} server failed: {}", first.name(), reason),
        }
        signal.trigger();

        let mut other = match first {
            Listener::Http => grpc_task,
            Listener::Grpc => http_task,
        };
        let drained = shutdown
            .drain(async {
                if let Err(reason) = join_outcome((&mut other).await) {
                    warn!("Listener error during shutdown: {}", reason);
                }
            })
            .await;
        if !drained {
            other.abort();
        }

        if let Some(db) = db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("✅ Database connection closed");
            }
        }

        info!("👋 User service shutdown complete");

        match outcome {
            Err(reason) => Err(ServerError::ListenerFailed {
                listener: first.name(),
                reason,
            }),
            Ok(()) if !requested => Err(ServerError::ListenerExited(first.name())),
            Ok(()) => Ok(()),
        }
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        info!("🛑 Shutting down user service...");
        self.trigger_shutdown();
        self.wait().await
    }
}

// ── Helpers ────────────────────────────────────────────────────────

async fn bind(listener: Listener, addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            listener: listener.name(),
            addr: addr.to_string(),
            source,
        })
}

fn local_addr(listener: Listener, socket: &TcpListener) -> Result<SocketAddr, ServerError> {
    socket.local_addr().map_err(|source| ServerError::Bind {
        listener: listener.name(),
        addr: "<unknown>".to_string(),
        source,
    })
}

fn join_outcome(
    res: Result<Result<(), String>, tokio::task::JoinError>,
) -> Result<(), String> {
    match res {
        Ok(inner) => inner,
        Err(e) if e.is_cancelled() => Err("task cancelled".to_string()),
        Err(e) => Err(format!("task panicked: {}", e)),
    }
}

/// The global metrics recorder can only be installed once per process;
/// later starts (restarts, tests) reuse the first handle.
fn prometheus_handle() -> Result<PrometheusHandle, ServerError> {
    static PROM_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    let mut slot = PROM_HANDLE
        .lock()
        .map_err(|_| ServerError::Metrics("recorder lock poisoned".to_string()))?;
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("📊 Prometheus metrics recorder installed");
            handle
        }
        Err(e) => {
            warn!("Global metrics recorder already set ({}); /metrics will be empty", e);
            PrometheusBuilder::new().build_recorder().handle()
        }
    };
    *slot = Some(handle.clone());
    Ok(handle)
}

/// Initialize tracing from the application config.
///
/// `RUST_LOG` takes precedence over `logging.level`. Call once at process
/// startup; later calls are ignored.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = "memory".to_string();
        config.server.http_host = "127.0.0.1".to_string();
        config.server.http_port = 0;
        config.server.grpc_host = "127.0.0.1".to_string();
        config.server.grpc_port = 0;
        config.server.shutdown_timeout = 5;
        config.security.bcrypt_cost = 4;
        config
    }

    #[tokio::test]
    async fn requested_shutdown_is_ok() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            auto_migrate: false,
        })
        .await
        .unwrap();

        assert!(handle.is_running());
        assert_ne!(handle.http_addr.port(), 0);
        assert_ne!(handle.grpc_addr.port(), 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_binding() {
        let mut config = memory_config();
        config.security.bcrypt_cost = 40;

        let err = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: false,
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ServerError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn port_in_use_is_a_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = memory_config();
        config.server.grpc_port = taken.local_addr().unwrap().port();

        let err = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: false,
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ServerError::Bind { listener: "gRPC", .. }));
    }

    #[tokio::test]
    async fn listener_exit_stops_the_other_and_reports_error() {
        let signal = ShutdownSignal::new();
        let observed = signal.clone();

        let http_task: ListenerTask = tokio::spawn(async { Err("accept failed".to_string()) });
        let grpc_task: ListenerTask = tokio::spawn(async move {
            observed.wait().await;
            Ok(())
        });

        let handle = ServerHandle {
            config: memory_config(),
            accounts: Arc::new(AccountService::new(
                Arc::new(InMemoryAccountRepository::new()) as Arc<dyn AccountRepository>,
                Arc::new(BcryptHasher::new(4)),
            )),
            http_addr: "127.0.0.1:1".parse().unwrap(),
            grpc_addr: "127.0.0.1:2".parse().unwrap(),
            db: None,
            shutdown: ShutdownCoordinator::new(5),
            http_task,
            grpc_task,
        };
        // Route the coordinator's signal to the fake gRPC task.
        let coordinator_signal = handle.shutdown_signal();
        tokio::spawn(async move {
            coordinator_signal.wait().await;
            signal.trigger();
        });

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, ServerError::ListenerFailed { listener: "HTTP", .. }));
    }
}
