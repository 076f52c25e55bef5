use anyhow::Result;
use coach_hub::api::{routes::create_routes, AppState};
use coach_hub::config::{run_migrations, AppConfig, DatabaseConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coach_hub={0},tower_http={0}", config.log_level)));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_development() {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    let db_config = DatabaseConfig::from_env()?;
    let pool = db_config.create_pool().await?;
    info!(max_connections = db_config.max_connections, "database pool ready");

    if config.run_migrations {
        run_migrations(&pool).await?;
        info!("migrations applied");
    }

    let state = AppState::new(pool, &config);
    let app = create_routes(state, config.cors_origin.as_deref());

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!(environment = %config.environment, "coach-hub listening on http://{}", address);
    info!("health check available at http://{}/health", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
