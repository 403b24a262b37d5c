//! itemgate server - Main entry point

use anyhow::{Context, Result};
use itemgate_common::logging::{init_logging, LogConfig};
use std::{sync::Arc, time::Duration};
use tracing::info;

use itemgate_server::{
    api::{self, AppState},
    auth::{JwksCache, TokenVerifier},
    config::Config,
    contract::ApiContract,
    db::{self, DbConfig, PgItemStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::for_service(
        "itemgate-server",
        "itemgate_server=debug,tower_http=debug,sqlx=warn",
    )
    .merge_env()?;
    init_logging(&log_config)?;

    info!("Starting itemgate server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}{}",
        config.server.host, config.server.port, config.server.base_path
    );

    let contract = ApiContract::embedded().context("embedded OpenAPI document is invalid")?;

    let pool = db::create_pool(&DbConfig::from(&config.database)).await?;
    db::health_check(&pool).await?;
    db::run_migrations(&pool).await?;

    let keys = Arc::new(
        JwksCache::fetch(&config.token.issuer_url)
            .await
            .context("failed to load the issuer's signing keys")?,
    );
    let refresh_task = keys
        .clone()
        .spawn_refresh(Duration::from_secs(config.token.jwks_refresh_secs));

    let state = AppState {
        items: Arc::new(PgItemStore::new(pool.clone())),
        verifier: Arc::new(TokenVerifier::new(keys, &config.token.issuer_url)),
        contract: Arc::new(contract),
    };

    let app = api::create_router(state, &config);
    let result = api::serve(app, &config.server).await;

    refresh_task.abort();
    pool.close().await;

    result
}
