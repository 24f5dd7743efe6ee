//! Binary entry point for `repair-service`: loads configuration,
//! wires up the credit store if configured, and serves the router until
//! shutdown is requested.

use std::sync::Arc;

use anyhow::Context;
use repair_core::schema::SchemaRegistry;
use repair_service::config::Config;
use repair_service::store::CreditStore;
use repair_service::{build_router, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let credit_store = match &config.credit_store_path {
        Some(path) => Some(CreditStore::load(path).with_context(|| format!("loading credit store at {}", path.display()))?),
        None => None,
    };

    let state = Arc::new(AppState { schemas: SchemaRegistry::bootstrap(), credit_store });
    let router = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "repair-service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving requests")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
