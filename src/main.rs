use std::sync::Arc;

use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rss_reader::config::Config;
use rss_reader::db::Database;
use rss_reader::fetcher::Fetcher;
use rss_reader::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rss_reader=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("RSS_READER_CONFIG").unwrap_or_else(|_| "reader.toml".to_string());
    let config = Config::load_or_default(&config_path)?.with_env_overrides();
    info!("Loaded configuration from {}", config_path);

    // Initialize database
    let db = Database::new(&config.database_url).await?;
    db.initialize().await?;
    let seeded = db.seed_feeds(&config.feeds).await?;
    info!("Database initialized ({} seed feeds added)", seeded);

    let state = Arc::new(AppState {
        db: Arc::new(db),
        fetcher: Arc::new(Fetcher::from_config(&config)?),
    });

    // Build router
    let app = routes::router(state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
