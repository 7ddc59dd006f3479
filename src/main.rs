use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use slotbook::config::AppConfig;
use slotbook::db;
use slotbook::handlers;
use slotbook::services::clock::SystemClock;
use slotbook::services::notify::telegram::TelegramNotifier;
use slotbook::services::notify::{LogNotifier, Notifier};
use slotbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let notifier: Arc<dyn Notifier> = if config.telegram_bot_token.is_empty() {
        tracing::warn!("TELEGRAM_BOT_TOKEN not set, booking notifications will only be logged");
        Arc::new(LogNotifier)
    } else {
        tracing::info!("using Telegram notifier (api: {})", config.telegram_api_url);
        Arc::new(TelegramNotifier::new(
            config.telegram_bot_token.clone(),
            config.telegram_api_url.clone(),
        ))
    };

    let state = AppState::new(conn, config.clone(), notifier, Arc::new(SystemClock));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
