use std::sync::Arc;

use clap::Parser;
use menu_cache::cache::MenuCache;
use menu_cache::snapshot::SnapshotStore;
use menu_cache::{jobs, settings, storage, web};
use migration::{Migrator, MigratorTrait};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "menu-cache",
    version,
    about = "Role-based menu authorization cache"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database)
    let db = storage::init(&settings.database).await?;
    Migrator::up(&db, None).await.into_diagnostic()?;
    storage::ensure_default_roles(&db).await?;

    // warm the cache, building the snapshot if there is none yet
    let cache = Arc::new(MenuCache::new(
        SnapshotStore::new(settings.cache.snapshot_path.clone()),
        Arc::new(db.clone()),
        settings.overrides.to_overrides(),
    ));
    let index = cache.ensure_cache().await?;
    tracing::info!(
        roles = index.roles().len(),
        menu_items = index.menu_items().len(),
        "Menu cache ready"
    );

    let mut sched = if settings.scheduler.enabled {
        Some(jobs::init_scheduler(db.clone(), cache.clone(), settings.scheduler.refresh_hour).await?)
    } else {
        tracing::info!("Scheduler disabled, snapshot is only rebuilt on demand");
        None
    };

    web::serve(&settings, db, cache, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down");
    })
    .await?;

    if let Some(sched) = sched.as_mut() {
        sched.shutdown().await.into_diagnostic()?;
    }
    Ok(())
}
