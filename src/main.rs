//! Keeper Server entry point.

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use keeper_server::AppState;
use keeper_server::config::Config;
use keeper_service::ServiceState;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Process-wide shutdown signal, shared by the HTTP server and every shard reaper
    let cancel = CancellationToken::new();

    let service = ServiceState::new(&config.service_config(), cancel.clone());
    let state = AppState::new(service.clone(), config.cors_origins.clone());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        shards = service.store().shard_count(),
        reap_interval_secs = config.reap_interval,
        "Keeper Server starting",
    );

    let app = keeper_server::router(state);

    let addr = SocketAddr::new(config.host.parse().expect("invalid host"), config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tokio::spawn(shutdown_signal(cancel.clone()));

    tracing::info!(%addr, "Keeper Server ready");

    if let Err(e) = keeper_http::serve(listener, app, cancel.clone().cancelled_owned()).await {
        tracing::error!("server error: {e}");
        cancel.cancel();
    }

    service.store().join_reapers().await;

    tracing::info!("Keeper Server shut down");
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutdown signal received");
        }
        () = cancel.cancelled() => return,
    }
    cancel.cancel();
}
