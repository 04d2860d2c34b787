//! Customer Portal API Gateway
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!   Browser / CLI     │                  GATEWAY                     │
//!  ───────────────────┼─▶ request id → trace → CORS → JSON body      │
//!                     │        → identity → dispatch ──┐             │
//!                     │                                 ▼             │
//!                     │   /api/auth      → auth collaborator          │──▶ auth service
//!                     │   /api/customer  → customer collaborator      │──▶ customer service
//!                     │   /api/auth (2nd)→ employee (shadowed)        │
//!  ◀──────────────────┼── collaborator response, verbatim            │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use portal_gateway::config;
use portal_gateway::http::GatewayServer;
use portal_gateway::lifecycle::{signals, Shutdown};
use portal_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "portal-gateway", version)]
#[command(about = "API gateway for the customer portal", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port (overrides config and PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Real environment variables win over .env entries.
    let dotenv = dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.listener.port = port;
    }

    logging::init(&config.observability);

    tracing::info!("portal-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        allowed_origins = ?config.cors.allowed_origins,
        routes = config.routes.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );
    if config.identity.enabled {
        tracing::warn!(
            header = %config.identity.header,
            placeholder = %config.identity.placeholder,
            "Placeholder identity injection is enabled; do not use in production"
        );
    }

    if config.observability.metrics_enabled {
        // The address was checked by validation.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    // Pipeline and routes are fully built before the listener exists.
    let server = GatewayServer::new(config)?;

    let listener = TcpListener::bind(server.config().listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
