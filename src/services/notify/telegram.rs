use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::Notifier;

pub struct TelegramNotifier {
    bot_token: String,
    api_url: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, api_url: String) -> Self {
        Self {
            bot_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, message: &str) -> anyhow::Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);

        self.client
            .post(&url)
            .json(&json!({
                "chat_id": chat_id,
                "text": message,
            }))
            .send()
            .await
            .context("failed to call Telegram API")?
            .error_for_status()
            .context("Telegram API returned error")?;

        Ok(())
    }
}
