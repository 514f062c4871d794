// src/notify/telegram.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::markdown::{render_suggestion, render_suggestion_plain};
use super::subscribers::SubscriberRegistry;
use super::{Delivery, Suggestion};
use crate::config::TelegramConfig;
use crate::error::DeliveryError;

/// Upper bound for send attempts; keeps the backoff shift in range.
pub const MAX_SEND_ATTEMPTS: u8 = 8;
const BACKOFF_BASE_MS: u64 = 500;

/// Thin Telegram Bot API client (sendMessage + getUpdates).
#[derive(Clone)]
pub struct TelegramClient {
    base: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str) -> Self {
        Self {
            base: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn from_config(cfg: &TelegramConfig) -> Option<Self> {
        let token = cfg.bot_token.as_deref()?;
        Some(
            Self::new(&cfg.api_base, token)
                .with_timeout(cfg.timeout_secs)
                .with_retries(cfg.max_retries),
        )
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.clamp(1, MAX_SEND_ATTEMPTS);
        self
    }

    /// Send one message. Transport errors, 429 and 5xx are retried with
    /// exponential backoff; other 4xx are returned immediately.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: false,
        };
        let url = format!("{}/sendMessage", self.base);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    let description = rsp
                        .json::<ApiResponse<serde_json::Value>>()
                        .await
                        .ok()
                        .and_then(|r| r.description)
                        .unwrap_or_else(|| status.to_string());
                    let e = DeliveryError::Rejected {
                        status: status.as_u16(),
                        description,
                    };
                    if !(status.is_server_error() || status.as_u16() == 429) {
                        return Err(e);
                    }
                    e
                }
                Err(e) => DeliveryError::Transport(e.to_string()),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tokio::time::sleep(backoff(attempt)).await;
        }
    }

    /// Try MarkdownV2 first; if Telegram rejects the markup (HTTP 400), resend as plain text.
    pub async fn send_markdown_or_plain(
        &self,
        chat_id: i64,
        markdown: &str,
        plain: &str,
    ) -> Result<(), DeliveryError> {
        match self.send_message(chat_id, markdown, Some("MarkdownV2")).await {
            Err(e) if e.status() == Some(400) => {
                tracing::debug!(chat_id, error = %e, "markdown rejected, sending as plain text");
                self.send_message(chat_id, plain, None).await
            }
            other => other,
        }
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, poll_secs: u64) -> Result<Vec<Update>, DeliveryError> {
        let url = format!("{}/getUpdates", self.base);
        let rsp = self
            .client
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", poll_secs.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .timeout(Duration::from_secs(poll_secs) + self.timeout)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = rsp.status();
        let parsed: ApiResponse<Vec<Update>> = rsp
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        if !parsed.ok {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: parsed.description.unwrap_or_default(),
            });
        }
        Ok(parsed.result.unwrap_or_default())
    }
}

/// Delivers suggestions to the operator chat and every subscriber.
pub struct TelegramDelivery {
    client: TelegramClient,
    chat_id: Option<i64>,
    subscribers: SubscriberRegistry,
}

impl TelegramDelivery {
    pub fn new(client: TelegramClient, chat_id: Option<i64>, subscribers: SubscriberRegistry) -> Self {
        Self {
            client,
            chat_id,
            subscribers,
        }
    }

    /// Operator chat first, then subscribers, without duplicates.
    fn recipients(&self) -> Vec<i64> {
        let mut out: Vec<i64> = self.chat_id.into_iter().collect();
        for id in self.subscribers.snapshot() {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn send_suggestion(&self, s: &Suggestion) {
        let recipients = self.recipients();
        if recipients.is_empty() {
            tracing::warn!(topic = %s.title, "no Telegram recipients configured");
            return;
        }
        let md = render_suggestion(s);
        let plain = render_suggestion_plain(s);

        for chat_id in recipients {
            match self.client.send_markdown_or_plain(chat_id, &md, &plain).await {
                Ok(()) => {
                    counter!("notify_sent_total").increment(1);
                }
                Err(e) => {
                    counter!("notify_errors_total").increment(1);
                    tracing::warn!(chat_id, error = %e, "telegram send failed");
                    // Blocked by the user: stop sending to them.
                    if e.status() == Some(403) && self.subscribers.remove(chat_id) {
                        tracing::info!(chat_id, "removed blocked subscriber");
                    }
                }
            }
        }
    }

    async fn send_error(&self, message: &str) {
        let Some(chat_id) = self.chat_id else {
            tracing::warn!(%message, "run error (no operator chat configured)");
            return;
        };
        let text = format!("❌ Bot Error: {message}");
        if let Err(e) = self.client.send_message(chat_id, &text, None).await {
            counter!("notify_errors_total").increment(1);
            tracing::warn!(error = %e, "failed to send error notice to Telegram");
        }
    }
}

/// Delay after the `attempt`-th failed send: 500ms doubling per attempt.
fn backoff(attempt: u8) -> Duration {
    let shift = u32::from(attempt.saturating_sub(1)).min(u32::from(MAX_SEND_ATTEMPTS));
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(1u64 << shift))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_are_clamped() {
        let c = TelegramClient::new("https://api.telegram.org", "t");
        assert_eq!(c.clone().with_retries(0).max_retries, 1);
        assert_eq!(c.clone().with_retries(3).max_retries, 3);
        assert_eq!(c.with_retries(200).max_retries, MAX_SEND_ATTEMPTS);
    }

    #[test]
    fn backoff_doubles_and_stays_bounded() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(4), Duration::from_millis(4000));
        assert_eq!(backoff(u8::MAX), Duration::from_millis(500 << MAX_SEND_ATTEMPTS));
    }

    #[test]
    fn recipients_dedup_operator_chat() {
        let subs = SubscriberRegistry::new();
        subs.add(5);
        subs.add(1);
        let d = TelegramDelivery::new(TelegramClient::new("https://api.telegram.org", "t"), Some(5), subs);
        assert_eq!(d.recipients(), vec![5, 1]);
    }

    #[test]
    fn update_payload_deserializes() {
        let body = r#"{"ok":true,"result":[{"update_id":10,"message":{"message_id":1,"chat":{"id":42,"type":"private"},"text":"/subscribe"}}]}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let updates = parsed.result.unwrap();
        assert_eq!(updates[0].update_id, 10);
        let msg = updates[0].message.as_ref().unwrap();
        assert_eq!(msg.chat.id, 42);
        assert_eq!(msg.text.as_deref(), Some("/subscribe"));
    }
}
