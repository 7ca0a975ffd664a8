//! mcp-routerd - MCP Router Daemon
//!
//! HTTP gateway that routes tool calls to one of two MCP backends (official
//! and custom), failing over to the other backend once when the first fails.
//!
//! Usage:
//!   mcp-routerd [OPTIONS]
//!
//! Every option can also be set through the environment (`ROUTER_PORT`,
//! `OFFICIAL_MCP_URL`, ...) or a TOML file passed with `--config`.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mcp_router_api::{create_router, AppState, Metrics};
use mcp_router_client::McpClient;
use mcp_router_gateway::{spawn_catalog_refresh, FailoverGateway, CATALOG_REFRESH_INTERVAL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Args, RouterConfig};

const LOG_TARGETS: [&str; 4] = [
    "mcp_routerd",
    "mcp_router_api",
    "mcp_router_gateway",
    "mcp_router_client",
];

fn init_logging(config: &RouterConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, config.log_level))
            .collect();
        EnvFilter::new(directives.join(","))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RouterConfig::load(Args::parse())?;
    init_logging(&config);

    tracing::info!("Starting mcp-routerd (MCP Router Daemon)");
    tracing::info!(
        official = %config.official.url,
        custom = %config.custom.url,
        timeout_ms = config.request_timeout.as_millis() as u64,
        auth = config.api_key.is_some(),
        "Configured backends"
    );

    let official = McpClient::new(config.client_config("official", &config.official))
        .context("Failed to create official backend client")?;
    let custom = McpClient::new(config.client_config("custom", &config.custom))
        .context("Failed to create custom backend client")?;
    let gateway = Arc::new(FailoverGateway::new(
        official.shared(),
        custom.shared(),
    ));

    let metrics = Arc::new(Metrics::new());
    let refresh_metrics = Arc::clone(&metrics);
    let refresh = spawn_catalog_refresh(
        Arc::clone(&gateway),
        CATALOG_REFRESH_INTERVAL,
        move |report, catalog| refresh_metrics.record_refresh(report, catalog),
    );

    let state = AppState::with_metrics(gateway, config.api_config(), metrics);
    let app = create_router(state);

    tracing::info!("Router listening on {}", config.listen);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /metrics");
    tracing::info!("  GET  /catalog");
    tracing::info!("  POST /mcp/tools.call");
    tracing::info!("  POST /notion/pages.create");

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    refresh.abort();
    tracing::info!("mcp-routerd stopped");
    served.context("Router server failure")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
