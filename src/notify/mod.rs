pub mod markdown;
pub mod subscribers;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::TelegramConfig;
use crate::ingest::types::SourceKind;

pub use subscribers::SubscriberRegistry;
pub use telegram::{TelegramClient, TelegramDelivery};

/// A composed suggestion ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub title: String,
    pub source: SourceKind,
    pub link: String,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// Best-effort delivery channel. Implementations swallow and log their own
/// transport errors.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send_suggestion(&self, suggestion: &Suggestion);
    async fn send_error(&self, message: &str);
}

pub type DynDelivery = Arc<dyn Delivery>;

/// Log-only delivery used when no bot token is configured.
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn send_suggestion(&self, s: &Suggestion) {
        tracing::info!(
            topic = %s.title,
            source = %s.source,
            link = %s.link,
            suggestion = %s.text,
            "suggestion (log-only delivery)"
        );
    }

    async fn send_error(&self, message: &str) {
        tracing::error!(%message, "run error (log-only delivery)");
    }
}

/// Factory: Telegram when a bot token is configured, otherwise log-only.
pub fn build_delivery(cfg: &TelegramConfig, subscribers: SubscriberRegistry) -> DynDelivery {
    match TelegramClient::from_config(cfg) {
        Some(client) => Arc::new(TelegramDelivery::new(client, cfg.chat_id, subscribers)),
        None => {
            tracing::info!("Telegram disabled (no TELEGRAM_BOT_TOKEN); suggestions go to the log");
            Arc::new(LogDelivery)
        }
    }
}
