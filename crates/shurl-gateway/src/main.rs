use clap::Parser;
use shurl_core::Repository;
use shurl_gateway::identity::IdentityKeys;
use shurl_gateway::{App, AppState, Cli, GatewayConfig, StorageConfig};
use shurl_generator::RandomGenerator;
use shurl_service::{LinkService, ServiceConfig};
use shurl_storage::{InMemoryRepository, JsonFileRepository, SqliteRepository};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load(Cli::parse())?;
    shurl_telemetry::init(config.log_format, &config.log_filter)?;

    info!(
        server_address = %config.server_address,
        base_url = %config.base_url,
        storage = ?config.storage,
        trusted_subnet = ?config.trusted_subnet,
        "starting gateway server"
    );
    if config.jwt_secret == shurl_gateway::config::DEFAULT_JWT_SECRET {
        warn!("using the built-in jwt secret, set SHURL_JWT_SECRET in production");
    }

    let service_config = ServiceConfig::builder()
        .queue_capacity(config.queue_capacity)
        .build();
    let (service, worker) = match &config.storage {
        StorageConfig::Memory => start(InMemoryRepository::new(), service_config),
        StorageConfig::JsonFile(path) => start(JsonFileRepository::open(path).await?, service_config),
        StorageConfig::Sqlite(dsn) => start(SqliteRepository::connect(dsn).await?, service_config),
    };

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        service,
        config.base_url.clone(),
        IdentityKeys::new(&config.jwt_secret),
        shutdown.clone(),
    );
    let app = App::router(state, config.trusted_subnet);

    let listener = tokio::net::TcpListener::bind(config.server_address).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await?;

    // The router, and with it every service handle, is gone; the worker
    // drains its queue and closes the repository.
    worker.await?;
    info!("gateway stopped");
    Ok(())
}

fn start<R: Repository>(repository: R, config: ServiceConfig) -> (LinkService, JoinHandle<()>) {
    LinkService::spawn(repository, RandomGenerator::new(), config)
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
