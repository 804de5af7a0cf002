use safe_commute::error::AppError;
use safe_commute::{api, config, state};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;

fn init_tracing(level: &str) -> Result<(), AppError> {
    let level = Level::from_str(level).map_err(|_| AppError::LogLevel(level.to_string()))?;
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = config::load_default()?;
    init_tracing(config.log_level())?;
    tracing::info!(
        app = %config.app.name,
        config_path = config::DEFAULT_CONFIG_PATH,
        "safe-commute starting"
    );

    let state = Arc::new(state::AppState::from_config(&config)?);
    if state.dataset().is_empty() {
        tracing::warn!("No crash records loaded - scores use time bucket defaults");
    }

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
