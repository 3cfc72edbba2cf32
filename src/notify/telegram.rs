//! Telegram notification sink.
//!
//! Thin wrapper around the Bot API `sendMessage` method. Markdown
//! parse mode, bounded by the shared request timeout. No delivery
//! acknowledgement is consumed beyond the HTTP status.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::Notifier;
use crate::types::Notification;

const BASE_URL: &str = "https://api.telegram.org";

/// Minimal slice of the Bot API response envelope.
#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    http: Client,
    token: String,
}

impl TelegramNotifier {
    pub fn new(token: String, timeout: Duration) -> Result<Self, anyhow::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rigwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, token })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let url = format!("{BASE_URL}/bot{}/sendMessage", self.token);
        debug!(chat_id = notification.chat_id, "sending Telegram alert");

        let body = serde_json::json!({
            "chat_id": notification.chat_id,
            "text": notification.text,
            "parse_mode": "Markdown",
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Telegram sendMessage failed with HTTP {status}");
        }

        let envelope: SendMessageResponse = resp.json().await?;
        if !envelope.ok {
            anyhow::bail!(
                "Telegram rejected message: {}",
                envelope.description.unwrap_or_else(|| "unknown".into())
            );
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
