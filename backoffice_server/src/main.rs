//! Back-office server for the training-institute website.
//!
//! Staff manage courses, blog posts, testimonials and gallery images here;
//! the public site submits course registrations and contact messages. Every
//! content write asks the public site to revalidate the pages that show it.

mod config;
mod metrics;
mod migration;
mod models;
mod routes;
mod schema;
mod services;
mod store;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use clap::Parser;

use crate::services::identity_service::IdentityClient;
use crate::services::revalidate::RevalidationNotifier;
use crate::services::slug::SlugDeriver;
use crate::services::SiteContext;
use crate::store::Backend;

#[derive(Parser)]
#[command(name = "backoffice", about = "Training site back-office server")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "SITE_PORT", default_value = "9090")]
    port: u16,

    /// Storage backend
    #[arg(long, env = "SITE_BACKEND", value_enum, default_value_t = Backend::Memory)]
    backend: Backend,

    /// PostgreSQL connection URL (postgres backend)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let cli = Cli::parse();

    tracing::info!("Starting back-office server...");

    let config = config::SiteConfig::from_env();
    let http = config.http_client()?;

    let store = store::connect(cli.backend, cli.database_url.as_deref(), &config).await?;

    let ctx = SiteContext {
        store,
        slugs: SlugDeriver::from_config(&config, http.clone()),
        notifier: RevalidationNotifier::from_config(&config, http.clone()),
    };
    let state = routes::SiteState {
        ctx,
        identity: IdentityClient::from_config(&config, http),
        secure_cookies: config.production,
    };

    let app = routes::site_router(state);

    // Initialize metrics
    metrics::init_metrics();

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("Back-office server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
