//! Things Server — application entry point.
//!
//! Loads configuration, connects and migrates SurrealDB, picks the cache
//! and event backends, bounds every operation by the configured deadline,
//! and keeps the wired service alive until Ctrl-C.

mod config;

use std::sync::Arc;
use std::time::Duration;

use things_auth::{AuthError, JwtIdentityProvider};
use things_cache::{CacheBackend, CacheError, MemoryCache, RedisCache};
use things_core::cache::CacheLayer;
use things_db::{DbError, SurrealStore};
use things_service::events::{
    BroadcastPublisher, EventError, NoopPublisher, RedisStreamPublisher,
};
use things_service::{DeadlineService, EventingService, EventsBackend, Service, ThingsService};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

type Store = SurrealStore<surrealdb::engine::remote::ws::Client>;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("things store: {0}")]
    Store(#[from] DbError),

    #[error("identity: {0}")]
    Auth(#[from] AuthError),

    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error("events: {0}")]
    Events(#[from] EventError),

    #[error("signal handling: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting things server...");

    if let Err(e) = run(config).await {
        error!(error = %e, "Things server failed");
        std::process::exit(1);
    }

    info!("Things server stopped.");
}

async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let store = Arc::new(things_db::open_store(&config.db).await?);
    let identity = JwtIdentityProvider::new(&config.auth)?;

    match config.cache.backend {
        CacheBackend::Memory => {
            info!("Using in-memory cache");
            with_cache(&config, store, identity, Arc::new(MemoryCache::new())).await
        }
        CacheBackend::Redis => {
            info!(url = %config.cache.redis_url, "Using Redis cache");
            let cache = RedisCache::connect(&config.cache.redis_url).await?;
            with_cache(&config, store, identity, Arc::new(cache)).await
        }
    }
}

async fn with_cache<L: CacheLayer>(
    config: &ServerConfig,
    store: Arc<Store>,
    identity: JwtIdentityProvider,
    cache: Arc<L>,
) -> Result<(), StartupError> {
    let service = ThingsService::new(store, cache, identity, config.service.clone());
    let deadline = config.service.operation_timeout();
    let events = &config.events;

    match events.backend {
        EventsBackend::None => serve(EventingService::new(service, NoopPublisher), deadline).await,
        EventsBackend::Broadcast => {
            let publisher = BroadcastPublisher::new(events.channel_capacity);
            let mut receiver = publisher.subscribe();
            tokio::spawn(async move {
                use tokio::sync::broadcast::error::RecvError;
                loop {
                    match receiver.recv().await {
                        Ok(event) => debug!(operation = event.operation(), ?event, "Event"),
                        Err(RecvError::Lagged(missed)) => {
                            warn!(missed, "Event log fell behind")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            serve(EventingService::new(service, publisher), deadline).await
        }
        EventsBackend::Redis => {
            let publisher =
                RedisStreamPublisher::connect(&events.redis_url, &events.stream, events.stream_max_len)
                    .await?;
            serve(EventingService::new(service, publisher), deadline).await
        }
    }
}

async fn serve<T: Service>(service: T, deadline: Duration) -> Result<(), StartupError> {
    let _service = Arc::new(DeadlineService::new(service, deadline));
    info!(deadline_secs = deadline.as_secs(), "Things service ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}
