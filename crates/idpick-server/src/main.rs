#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use core::future::Future;
use core::time::Duration;
use server::config::{CliArgs, ServerConfig};
use server::service::handler::PickerService;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let app = PickerService::new(config.clone()).router();

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config.server_addr, &config);
    let signal = shutdown.clone().cancelled_owned();
    let serve = async move { axum::serve(listener, app).with_graceful_shutdown(signal).await };
    let res = run_until_drained(serve, shutdown, config.shutdown_timeout).await;

    tracing::info!("Service shut down successfully");
    providers.shutdown();
    res
}

/// Drives the server until it exits on its own, or until `shutdown` fires and
/// in-flight requests have drained (bounded by `drain_timeout`).
async fn run_until_drained<F>(
    serve: F,
    shutdown: CancellationToken,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(serve);

    tokio::select! {
        res = &mut serve => res?,
        () = shutdown.cancelled() => {
            tracing::info!("Draining in-flight requests (up to {:?})", drain_timeout);
            match tokio::time::timeout(drain_timeout, &mut serve).await {
                Ok(res) => res?,
                Err(_) => tracing::warn!("Graceful drain timed out"),
            }
        }
    }

    Ok(())
}

fn log_startup_info(addr: &str, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting picker service on {} with full config: {:#?}",
            addr,
            config
        );
    } else {
        tracing::info!(
            "Starting picker service on {} with max_id {}",
            addr,
            config.max_id
        );
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    shutdown.cancel();
}
