pub mod queue;
pub mod telegram;

use async_trait::async_trait;

pub use queue::{Notification, NotificationQueue, RetryPolicy};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: &str, message: &str) -> anyhow::Result<()>;
}

/// Used when no bot token is configured: messages only reach the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, channel: &str, message: &str) -> anyhow::Result<()> {
        tracing::info!(channel = %channel, message = %message, "notification (not delivered, no bot token)");
        Ok(())
    }
}
