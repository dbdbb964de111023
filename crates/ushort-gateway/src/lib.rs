//! HTTP gateway wiring the shortening and redirect services behind `axum`.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use ushort_cache::{LayeredCache, MokaCacheConfig, MokaLinkCache, RedisLinkCache};
use ushort_redirector::{CachedRepository, Redirector, RedirectorService};
use ushort_shortener::ShortenerService;
use ushort_storage::{InMemoryRepository, PgRepository, Repository};

use crate::app::App;
use crate::cli::{CacheBackendArg, Cli, Command, StorageBackendArg};
use crate::state::AppState;

/// Runs the command selected on the command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    info!(
        storage_backend = %cli.storage,
        cache_backend = %cli.cache,
        "starting ushort"
    );

    match cli.storage {
        StorageBackendArg::InMemory => {
            if cli.action() != Command::Serve {
                warn!("in-memory storage starts empty, maintenance has nothing to do");
            }
            run_with(&cli, InMemoryRepository::new()).await
        }
        StorageBackendArg::Postgres => {
            let dsn = cli
                .postgres_dsn
                .as_deref()
                .context("postgres dsn is required when storage backend is postgres")?;
            let repository = PgRepository::connect(dsn, cli.postgres_max_connections)
                .await
                .context("failed to connect to postgres")?;
            repository.migrate().await.context("failed to run migrations")?;
            run_with(&cli, repository).await
        }
    }
}

async fn run_with<R>(cli: &Cli, repository: R) -> anyhow::Result<()>
where
    R: Repository + Clone,
{
    let shortener = ShortenerService::with_policy(repository.clone(), cli.shorten_policy.into());

    match cli.action() {
        Command::Repair { batch_size } => {
            let report = shortener.repair(batch_size).await?.into_result()?;
            info!(repaired = report.repaired, "repair finished");
            Ok(())
        }
        Command::Audit { batch_size } => {
            let report = shortener.audit(batch_size).await?.into_result()?;
            info!(
                scanned = report.scanned,
                pending = report.pending.len(),
                "audit passed"
            );
            Ok(())
        }
        Command::Serve => {
            if cli.repair_on_startup {
                let report = shortener.repair(cli::DEFAULT_BATCH_SIZE).await?;
                info!(repaired = report.repaired, "startup repair finished");
                if !report.is_clean() {
                    warn!(
                        failed = ?report.failed,
                        "serving with links that could not be repaired"
                    );
                }
            }
            let redirector = build_redirector(cli, repository).await?;
            serve(cli, AppState::new(Arc::new(shortener), redirector, &cli.public_base_url)).await
        }
    }
}

fn moka_cache(cli: &Cli) -> MokaLinkCache {
    match cli.cache_ttl() {
        Some(ttl) => MokaCacheConfig::builder()
            .max_capacity(cli.cache_capacity)
            .ttl(ttl)
            .build()
            .into(),
        None => MokaLinkCache::with_capacity(cli.cache_capacity),
    }
}

async fn redis_cache(cli: &Cli) -> anyhow::Result<RedisLinkCache> {
    let url = cli
        .redis_url
        .as_deref()
        .context("redis url is required for the selected cache backend")?;
    let cache = RedisLinkCache::connect(url)
        .await
        .context("failed to connect to redis")?;
    Ok(match cli.cache_ttl() {
        Some(ttl) => cache.with_ttl(ttl),
        None => cache,
    })
}

async fn build_redirector<R>(cli: &Cli, repository: R) -> anyhow::Result<Arc<dyn Redirector>>
where
    R: Repository,
{
    let redirector: Arc<dyn Redirector> = match cli.cache {
        CacheBackendArg::None => Arc::new(RedirectorService::new(repository)),
        CacheBackendArg::Moka => Arc::new(RedirectorService::new(CachedRepository::new(
            repository,
            moka_cache(cli),
        ))),
        CacheBackendArg::Redis => Arc::new(RedirectorService::new(CachedRepository::new(
            repository,
            redis_cache(cli).await?,
        ))),
        CacheBackendArg::Layered => {
            let cache = LayeredCache::new(moka_cache(cli), redis_cache(cli).await?);
            Arc::new(RedirectorService::new(CachedRepository::new(repository, cache)))
        }
    };
    Ok(redirector)
}

async fn serve(cli: &Cli, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(cli.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_addr))?;
    info!(
        listen_addr = %listener.local_addr()?,
        public_base_url = %cli.public_base_url,
        "starting gateway server"
    );

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
