use anyhow::Context;
use tracing_subscriber::EnvFilter;
use role_tasks::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
    services::{bootstrap, MemoryStore, RecordStore, RedisStore},
};

async fn serve<S: RecordStore>(store: S, config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(store, config);

    if let Some(admin) = bootstrap::ensure_admin(&state.store, &state.credentials, &state.config.bootstrap).await? {
        tracing::info!("Bootstrap admin {} ready", admin.id);
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server running on {}", addr);
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server stopped unexpectedly")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("Failed to load configuration")?;

    match config.store.backend {
        StoreBackend::Redis => {
            let url = config
                .redis
                .effective_url()
                .context("Sentinel enabled but no sentinel_url configured")?;
            let client = redis::Client::open(url).context("Invalid Redis URL")?;
            let store = RedisStore::connect(client).await.context("Failed to connect to Redis")?;
            tracing::info!("Using Redis store");
            serve(store, config).await
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            serve(MemoryStore::new(), config).await
        }
    }
}
