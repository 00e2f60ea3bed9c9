use std::sync::Arc;

use anyhow::Context;
use mediacat_catalog::{Catalog, maintenance};
use mediacat_db::SqliteStore;
use mediacat_probe::{DurationProbe, FfprobeDuration};
use mediacat_scanner::Reconciler;
use mediacat_server::config::ServerConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    info!(db_path = %config.db_path, "connecting to database");

    let pool = mediacat_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;

    mediacat_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    if let Err(e) = mediacat_db::repo::pages::seed_defaults(&pool).await {
        warn!(error = %e, "failed to seed default pages");
    }

    let probe: Option<Arc<dyn DurationProbe>> = if config.probe_enabled {
        Some(Arc::new(FfprobeDuration::new(&config.probe)))
    } else {
        info!("duration probe disabled");
        None
    };

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let reconciler = Reconciler::new(store, probe, config.probe.timeout);
    let (catalog, updates) = Catalog::new(reconciler);
    let catalog = Arc::new(catalog.with_session_lifespan(config.session_lifespan));

    // A failed first pass leaves an empty cache; the scheduled reload retries.
    match catalog.force_reconcile().await {
        Ok(summary) => info!(
            cached_videos = summary.cache.cached_videos,
            created = summary.reconcile.videos_created,
            "initial reload complete"
        ),
        Err(e) => error!(error = %e, "initial reload failed"),
    }

    let background = maintenance::spawn(catalog.clone(), updates, config.maintenance.clone());

    let app_state = mediacat_server::state::AppState { db: pool, catalog };
    let app = mediacat_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    background.shutdown().await;
    Ok(())
}
