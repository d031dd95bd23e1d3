use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paceline_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{MemoryStore, PgStore, SessionStore, VoiceMessageStore},
    router,
    services::tracker::SessionTracker,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paceline_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        port = config.port,
        store = if config.database_url.is_some() {
            "postgres"
        } else {
            "memory"
        },
        "Loaded configuration from environment/.env"
    );

    // Initialize storage
    let (sessions, messages): (Arc<dyn SessionStore>, Arc<dyn VoiceMessageStore>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = create_pool(database_url).await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                let store = Arc::new(PgStore::new(pool));
                (store.clone(), store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; running on the in-memory store");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let tracker = Arc::new(SessionTracker::new(sessions, messages));
    let state = AppState::new(tracker, config.clone());
    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
