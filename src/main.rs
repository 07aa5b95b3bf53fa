//! Matchday Settlement Job
//!
//! Entry point for one settlement run: takes the fixtures that just
//! reached a terminal state (from the job scheduler or the provider-ETL
//! completion hook), settles every open prediction touched by them,
//! closes out completed groups and reports the outcome.

use anyhow::Context;
use matchday_backend::config::AppConfig;
use matchday_backend::database::{create_pool, run_migrations};
use matchday_backend::services::{
    CacheInvalidator, HttpCacheInvalidator, NullCacheInvalidator, NullNotifier,
    RankChangeNotifier, RankingService, SettlementService, WebhookNotifier,
};
use matchday_backend::AppState;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("configuration error")?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("matchday_backend={},sqlx=warn", config.log_level).into()
            }),
        )
        .init();

    let fixture_ids = parse_fixture_ids(std::env::args().skip(1))?;
    if fixture_ids.is_empty() {
        anyhow::bail!("usage: matchday-settle <fixture-uuid> [<fixture-uuid> ...]");
    }

    info!("Matchday settlement job starting");
    info!("Environment: {}", config.environment);
    info!("Fixtures in batch: {}", fixture_ids.len());

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    let pool = create_pool(&config.database)
        .await
        .context("failed to create database pool")?;
    info!("Database connection pool created successfully");

    run_migrations(&pool, None)
        .await
        .context("database migration failed")?;
    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICE WIRING
    // =========================================================================
    let state = AppState::new(pool.clone());

    let ranking = Arc::new(RankingService::new(
        state.group_member_repo.clone(),
        state.user_repo.clone(),
        state.prediction_repo.clone(),
    ));

    let notifier: Arc<dyn RankChangeNotifier> = match &config.settlement.chat_webhook_url {
        Some(url) => {
            info!("Rank-change notifications -> {}", url);
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => Arc::new(NullNotifier),
    };

    let caches: Arc<dyn CacheInvalidator> = match &config.settlement.cache_service_url {
        Some(url) => {
            info!("Cache invalidation -> {}", url);
            Arc::new(HttpCacheInvalidator::new(url.clone()))
        }
        None => Arc::new(NullCacheInvalidator),
    };

    let settlement = SettlementService::new(
        state.fixture_repo.clone(),
        state.group_fixture_repo.clone(),
        state.group_repo.clone(),
        state.rules_repo.clone(),
        state.prediction_repo.clone(),
        ranking,
        notifier,
        caches,
        pool,
        config.settlement.clone(),
    );

    // =========================================================================
    // SETTLEMENT RUN
    // =========================================================================
    let outcome = settlement.settle(&fixture_ids).await?;

    info!(
        "Settlement job finished: {} settled, {} skipped, {} groups ended",
        outcome.settled, outcome.skipped, outcome.groups_ended
    );
    Ok(())
}

/// Parse the fixture UUIDs handed over by the triggering caller
fn parse_fixture_ids(args: impl Iterator<Item = String>) -> anyhow::Result<Vec<Uuid>> {
    args.map(|arg| {
        Uuid::parse_str(arg.trim()).with_context(|| format!("invalid fixture id: {}", arg))
    })
    .collect()
}
