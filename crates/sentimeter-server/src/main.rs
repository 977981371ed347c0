mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use sentimeter_core::ExampleStore;
use sentimeter_db::PgExampleStore;
use sentimeter_model::{EngineConfig, ScoringEngine};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sentimeter_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sentimeter_db::PoolConfig::from_app_config(&config);
    let pool = sentimeter_db::connect_pool(&config.database_url, pool_config).await?;
    sentimeter_db::run_migrations(&pool).await?;

    let store: Arc<dyn ExampleStore> = Arc::new(PgExampleStore::new(pool));
    let engine = ScoringEngine::new(EngineConfig::from_app_config(&config), store);

    // A failed warm-up is retried by the first scoring request.
    if let Err(e) = engine.current().await {
        tracing::error!(error = %e, "model warm-up failed; serving will retry on demand");
    }

    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&engine), config.retrain_interval_days).await?;

    let app = build_app(AppState { engine });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "sentimeter server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
