//! BitBridge user service: CLI server
//!
//! Runs the HTTP and gRPC listeners in one process, suitable for a
//! systemd unit or a container.
//!
//! ```sh
//! # Run with default config (~/.config/bitbridge-user/config.toml)
//! user-service
//!
//! # Custom config path
//! user-service --config /etc/bitbridge-user/config.toml
//!
//! # Override ports
//! user-service --http-port 8080 --grpc-port 50051
//!
//! # Validate config without starting
//! user-service --check
//!
//! # Write the effective config (defaults + overrides) and exit
//! user-service --write-config --grpc-port 50051
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use bitbridge_user::config::AppConfig;
use bitbridge_user::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "user-service",
    version,
    about = "BitBridge user identity service (REST + gRPC)",
    long_about = "Registers user accounts and resolves ids, emails and usernames \
                  to public or private account views.\n\n\
                  Default config: ~/.config/bitbridge-user/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "USER_SERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the gRPC listen port.
    #[arg(long)]
    grpc_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long, conflicts_with = "check")]
    write_config: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(bitbridge_user::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.http_port {
        config.server.http_port = port;
    }
    if let Some(port) = cli.grpc_port {
        config.server.grpc_port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // ── Config bootstrap mode ──────────────────────────────────
    if cli.write_config {
        if let Err(e) = config.validate().and_then(|_| config.save(&config_path)) {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
        println!("✅ Configuration written to {}", config_path.display());
        return ExitCode::SUCCESS;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        if let Err(e) = config.validate() {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
        println!("✅ Configuration is valid");
        println!("   Config file  : {}", config_path.display());
        println!("   HTTP address : {}", config.server.http_addr());
        println!("   gRPC address : {}", config.server.grpc_addr());
        println!("   Database     : {}", config.database.connection_url());
        println!("   Log level    : {}", config.logging.level);
        return ExitCode::SUCCESS;
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    // ── Start server ───────────────────────────────────────────
    let handle = match ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    match handle.wait().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
