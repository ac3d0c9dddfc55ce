//! ascari-gateway: dashboard backend in front of the ERP

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use ascari_gateway::config::{CacheBackend, Config};
use ascari_gateway::erp::ErpClient;
use ascari_gateway::{cache, create_router, AppState};

#[derive(Parser)]
#[command(name = "ascari-gateway")]
#[command(about = "HTTP backend proxying the sales dashboard to the ERP")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ascari-gateway.toml", env = "ASCARI_CONFIG")]
    config: PathBuf,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "ASCARI_PORT")]
    port: Option<u16>,

    /// Built frontend directory (overrides config file)
    #[arg(long, env = "ASCARI_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Redis URL; switches the quote cache to redis
    #[arg(long, env = "ASCARI_REDIS_URL")]
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ascari_gateway=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    info!(config = %cli.config.display(), "Starting ascari-gateway");

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.server.http_port = port;
    }
    if let Some(static_dir) = cli.static_dir {
        config.server.static_dir = static_dir;
    }
    if let Some(redis_url) = cli.redis_url {
        config.cache.backend = CacheBackend::Redis;
        config.cache.redis_url = Some(redis_url);
    }
    config.validate()?;

    info!("Static dir: {}", config.server.static_dir.display());
    if !config.server.static_dir.join("index.html").exists() {
        tracing::warn!("No index.html in static dir, only the API will be useful");
    }

    let erp = ErpClient::new(Duration::from_secs(config.erp.timeout_secs))?;
    let quotes = cache::from_config(&config.cache).await;

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config, erp, quotes));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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
}
