use std::env;
use std::time::Duration;

use crate::services::notify::RetryPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub notify_max_attempts: u32,
    pub notify_retry_delay_ms: u64,
    pub notify_queue_capacity: usize,
    pub slot_step_minutes: i64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "slotbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            notify_max_attempts: env_or("NOTIFY_MAX_ATTEMPTS", 3),
            notify_retry_delay_ms: env_or("NOTIFY_RETRY_DELAY_MS", 2000),
            notify_queue_capacity: env_or("NOTIFY_QUEUE_CAPACITY", 256),
            slot_step_minutes: env_or("SLOT_STEP_MINUTES", 30),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.notify_max_attempts,
            delay: Duration::from_millis(self.notify_retry_delay_ms),
        }
    }
}
