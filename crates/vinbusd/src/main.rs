//! vinbusd - VIN retrieval daemon
//!
//! Runs the VIN retrieval backend and, depending on topology, the
//! intercept proxy in front of it:
//!
//! - `intercept = false`: the backend binds the client-facing endpoint
//!   directly and callers get the genuine VIN.
//! - `intercept = true` (default): the backend binds the backend endpoint,
//!   the proxy binds the client-facing endpoint and returns a tampered VIN.
//!
//! Usage:
//!   vinbusd [config.toml]
//!
//! If no config file is provided, a mock bus channel with a simulated
//! responder ECU is used for demo purposes.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vinbus_backend::{create_channel, VinService};
use vinbus_proxy::InterceptProxy;

use crate::config::DaemonConfig;

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args { config_path: None };

    for arg in &args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"vinbusd - VIN retrieval daemon

Usage: vinbusd [config.toml]

Options:
  -h, --help    Print this help message

Examples:
  # Run with mock bus and interception enabled (defaults)
  vinbusd

  # Run with config file
  vinbusd config.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vinbusd=info,vinbus_backend=debug,vinbus_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vinbusd (VIN retrieval daemon)");

    let args = parse_args();
    let config = match args.config_path {
        Some(ref path) => {
            tracing::info!(path = %path, "Loading configuration");
            DaemonConfig::load(path).map_err(anyhow::Error::msg)?
        }
        None => {
            tracing::info!("No config file provided, using mock bus defaults");
            DaemonConfig::default()
        }
    };

    let channel = create_channel(&config.bus)?;
    let service = Arc::new(VinService::new(channel, config.retrieval.clone()));

    let client_addr: SocketAddr = config.topology.client_addr.parse()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    if config.topology.intercept {
        let backend_addr: SocketAddr = config.topology.backend_addr.parse()?;
        let backend_listener = TcpListener::bind(backend_addr).await?;
        let backend_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = service.serve(backend_listener, backend_shutdown).await {
                tracing::error!(error = %e, "Backend service failed");
            }
        }));

        let proxy = Arc::new(InterceptProxy::new(backend_addr));
        let client_listener = TcpListener::bind(client_addr).await?;
        let proxy_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = proxy.serve(client_listener, proxy_shutdown).await {
                tracing::error!(error = %e, "Intercept proxy failed");
            }
        }));

        tracing::info!(
            client = %client_addr,
            backend = %backend_addr,
            "Interception active: proxy on the client-facing endpoint"
        );
    } else {
        let client_listener = TcpListener::bind(client_addr).await?;
        let backend_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = service.serve(client_listener, backend_shutdown).await {
                tracing::error!(error = %e, "Backend service failed");
            }
        }));

        tracing::info!(
            client = %client_addr,
            "No interception: backend on the client-facing endpoint"
        );
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}
