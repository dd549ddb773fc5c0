use std::sync::Arc;

use anyhow::Context;
use common_auth::{AuthConfig, AuthGuard};
use drink_service::config::load_service_config;
use drink_service::store::{DrinkStore, InMemoryDrinkStore, PgDrinkStore};
use drink_service::{build_router, AppState};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;
    let auth_config = AuthConfig::from_env()?;
    info!(
        domain = %auth_config.domain,
        audience = %auth_config.audience,
        jwks_url = %auth_config.jwks_url,
        jwks_cache_secs = auth_config.jwks_cache_ttl.as_secs(),
        "Auth guard configured"
    );
    let auth_guard = Arc::new(AuthGuard::from_config(auth_config)?);

    let store: Arc<dyn DrinkStore> = match &config.database_url {
        Some(url) => {
            let db = PgPool::connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let store = PgDrinkStore::new(db);
            if config.reset_on_start {
                warn!("DRINKS_RESET_ON_START set; dropping all drinks");
                store.reset().await?;
            } else {
                store.ensure_schema().await?;
            }
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; drinks are kept in memory and lost on restart");
            Arc::new(InMemoryDrinkStore::new())
        }
    };

    let state = AppState::new(store, auth_guard);
    let app = build_router(state, &config.cors_allowed_origins);

    let addr = config.addr();
    info!(%addr, "starting drink-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
