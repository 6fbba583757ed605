//! Feedgate API server entrypoint.

use clap::Parser;
use feedgate_api::{build_app, AppState, Settings};
use feedgate_cache::RedisCache;
use feedgate_core::ports::{FeedCache, FeedStore};
use feedgate_db::{Database, PgFeedStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "feedgate")]
#[command(author, version, about = "Public-data feed gateway", long_about = None)]
struct Cli {
    /// Bind address, overriding FEEDGATE_BIND.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(bind) = cli.bind {
        settings.bind = bind;
    }

    let store: Option<Arc<dyn FeedStore>> = match &settings.database_url {
        Some(url) => {
            let db = Database::connect(url).await?;
            db.migrate().await?;
            Some(Arc::new(PgFeedStore::new(db.pool().clone())))
        }
        None => {
            tracing::warn!("no database configured; durable store disabled");
            None
        }
    };

    let cache: Option<Arc<dyn FeedCache>> = match &settings.redis_url {
        Some(url) => match RedisCache::connect(url).await {
            Ok(cache) => Some(Arc::new(cache)),
            Err(err) if settings.cache_strict => return Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "cache backend unavailable; continuing without cache");
                None
            }
        },
        None => None,
    };

    let bind = settings.bind.clone();
    let state = Arc::new(AppState::new(settings, store, cache)?);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %bind, "feedgate listening");
    axum::serve(listener, app).await?;
    Ok(())
}
