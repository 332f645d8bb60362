//! # Relief Exchange Binary
//!
//! Assembles the application from configuration and compile-time features.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api_adapters::AppState;
use auth_adapters::{JwtIdentityProvider, JwtSettings};
use configs::{AppConfig, LoggingSettings, StorageBackend, StorageSettings};
use services::Deps;
use storage_adapters::{DocumentRepos, DocumentStore, MemoryDocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = configs::load_dotenv();
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.logging);
    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded .env");
    }

    let store = open_store(&config.storage).await?;
    let repos = DocumentRepos::new(store);

    let identity = JwtIdentityProvider::new(JwtSettings {
        secret: config.auth.jwt_secret.clone(),
        issuer: config.auth.issuer.clone(),
        audience: config.auth.audience.clone(),
        leeway_secs: config.auth.leeway_secs,
        token_ttl_secs: config.auth.token_ttl_secs,
    })
    .context("configuring the JWT identity provider")?;

    let deps = Deps {
        donations: Arc::new(repos.clone()),
        users: Arc::new(repos.clone()),
        bans: Arc::new(repos),
        identity: Arc::new(identity),
    };
    let app = api_adapters::router(AppState::new(deps), config.server.body_limit_bytes);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, backend = ?config.storage.backend, "relief exchange listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    info!("shut down cleanly");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn open_store(settings: &StorageSettings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.backend {
        StorageBackend::Memory => {
            info!("using the in-memory document store, data is lost on exit");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        #[cfg(feature = "db-postgres")]
        StorageBackend::Postgres => {
            use secrecy::ExposeSecret;

            let url = settings
                .database_url
                .as_ref()
                .context("storage.database_url is not set")?;
            let store = storage_adapters::PostgresDocumentStore::connect(
                url.expose_secret(),
                settings.max_connections,
            )
            .await
            .context("connecting to postgres")?;
            store.migrate().await.context("preparing the document table")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "db-postgres"))]
        StorageBackend::Postgres => {
            anyhow::bail!("this build does not include the postgres backend (feature `db-postgres`)")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
