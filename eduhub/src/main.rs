use eduhub::config::{PublisherSettings, Settings};
use eduhub::services::ServiceContainer;
use eduhub::{database, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();

    // Initialize logging; the guard must live for the process lifetime.
    let _log_guard = logging::init(&settings);

    // Initialize database
    let pool = database::init_pool(&settings.database_url).await?;
    database::run_migrations(&pool).await?;

    let container = ServiceContainer::new(pool, PublisherSettings::from_env()).await?;

    tracing::info!("eduhub initialized successfully");

    // The HTTP layer is mounted by the hosting process; this binary keeps
    // background publication tasks alive until interrupted.
    tokio::signal::ctrl_c().await?;
    container.shutdown();

    Ok(())
}
