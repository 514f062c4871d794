// src/bot.rs
//! Telegram command handling over a `getUpdates` long-poll loop.

use std::sync::Arc;
use std::time::Duration;

use crate::ingest::types::CandidateTopic;
use crate::ingest::TrendAggregator;
use crate::notify::{SubscriberRegistry, TelegramClient};
use crate::scheduler::{trigger_now, SharedJob, TriggerOutcome};
use crate::suggest::DynGenerator;

const POLL_SECS: u64 = 30;
/// Drafts produced by one `/tweet`.
pub const TWEET_DRAFTS: usize = 3;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Trending,
    Tweet,
    Subscribe,
    Unsubscribe,
    Run,
    Unknown(String),
}

impl Command {
    /// Parse the first word of a message. `/cmd@BotName` is accepted;
    /// anything that is not a slash command yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_ascii_lowercase();
        let cmd = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "trending" => Self::Trending,
            "tweet" => Self::Tweet,
            "subscribe" => Self::Subscribe,
            "unsubscribe" => Self::Unsubscribe,
            "run" => Self::Run,
            _ => Self::Unknown(name),
        };
        Some(cmd)
    }
}

pub const HELP_TEXT: &str = "Trend Scout\n\n\
/trending - Current trending topics\n\
/tweet - Draft posts for the top trends\n\
/subscribe - Receive post suggestions for new trends\n\
/unsubscribe - Stop receiving suggestions\n\
/run - Run the trend check now (operator chat only)\n\
/help - Show this message";

pub fn welcome_text() -> String {
    format!("👋 Welcome to Trend Scout!\n\nI watch trending topics and suggest posts about the new ones.\n\n{HELP_TEXT}")
}

/// Numbered list of the current trends, or a notice when there are none.
pub fn render_trending(trends: &[CandidateTopic]) -> String {
    if trends.is_empty() {
        return "❌ Unable to fetch trends at the moment.".to_string();
    }
    let mut out = String::from("📈 Current Trending Topics:\n\n");
    for (i, t) in trends.iter().enumerate() {
        out.push_str(&format!("{}. {} ({}, {})\n", i + 1, t.title, t.category, t.source));
    }
    out.push_str("\nUse /subscribe to get suggestions as new topics appear.");
    out
}

/// Numbered drafts, one per topic.
pub fn render_drafts(drafts: &[(String, String)]) -> String {
    if drafts.is_empty() {
        return "❌ Unable to fetch trends at the moment.".to_string();
    }
    let mut out = String::from("💡 Post ideas for current trends:\n");
    for (i, (title, text)) in drafts.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n{}\n", i + 1, title, text));
    }
    out
}

pub fn render_trigger(outcome: &TriggerOutcome) -> String {
    match outcome {
        TriggerOutcome::Busy => "⏳ A run is already in progress.".to_string(),
        TriggerOutcome::Completed(Ok(r)) => format!(
            "✅ Run #{} finished: {} trends, {} new, {} sent, {} failed.",
            r.execution, r.trends, r.novel, r.processed, r.failed
        ),
        TriggerOutcome::Completed(Err(e)) => format!("❌ {e}"),
    }
}

/// Everything a command handler may touch.
#[derive(Clone)]
pub struct BotContext {
    pub client: TelegramClient,
    pub subscribers: SubscriberRegistry,
    pub aggregator: Arc<TrendAggregator>,
    pub generator: DynGenerator,
    pub job: SharedJob,
    /// Only this chat may start a run that delivers to everyone.
    pub operator_chat: Option<i64>,
}

impl BotContext {
    /// Reply text for `cmd` sent from `chat_id`.
    pub async fn handle(&self, chat_id: i64, cmd: Command) -> String {
        match cmd {
            Command::Start => welcome_text(),
            Command::Help | Command::Unknown(_) => HELP_TEXT.to_string(),
            Command::Trending => {
                let trends = self.aggregator.get_all_trends().await;
                render_trending(&trends)
            }
            Command::Subscribe => {
                if self.subscribers.add(chat_id) {
                    tracing::info!(chat_id, subscribers = self.subscribers.len(), "subscribed");
                    "✅ Subscribed! You'll receive suggestions when new trends appear.".to_string()
                } else {
                    "You're already subscribed.".to_string()
                }
            }
            Command::Unsubscribe => {
                if self.subscribers.remove(chat_id) {
                    tracing::info!(chat_id, subscribers = self.subscribers.len(), "unsubscribed");
                }
                "❌ Unsubscribed from trend suggestions.".to_string()
            }
            Command::Tweet => render_drafts(&self.draft_posts().await),
            Command::Run if self.operator_chat == Some(chat_id) => {
                render_trigger(&trigger_now(&self.job).await)
            }
            Command::Run => {
                tracing::info!(chat_id, "run request from non-operator chat refused");
                "⛔ /run is only available in the operator chat.".to_string()
            }
        }
    }

    /// Drafts for the top merged trends, replied to the asking chat only.
    /// Nothing is marked seen or delivered to subscribers.
    async fn draft_posts(&self) -> Vec<(String, String)> {
        let trends = self.aggregator.get_all_trends().await;
        let mut drafts = Vec::with_capacity(TWEET_DRAFTS);
        for topic in trends.into_iter().take(TWEET_DRAFTS) {
            let context = topic.description.as_deref().unwrap_or(&topic.title);
            match self.generator.generate(&topic.title, context).await {
                Ok(text) => drafts.push((topic.title, text)),
                Err(e) => tracing::warn!(topic = %topic.title, error = %e, "draft generation failed"),
            }
        }
        drafts
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.client.send_message(chat_id, text, None).await {
            tracing::warn!(chat_id, error = %e, "bot reply failed");
        }
    }
}

/// Long-poll loop. Runs until the task is dropped.
pub async fn run_bot(ctx: BotContext) {
    tracing::info!("telegram command loop started");
    let mut offset: i64 = 0;
    loop {
        let updates = match ctx.client.get_updates(offset, POLL_SECS).await {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(msg) = update.message else { continue };
            let Some(cmd) = msg.text.as_deref().and_then(Command::parse) else {
                continue;
            };
            tracing::debug!(chat_id = msg.chat.id, ?cmd, "bot command");

            // /trending, /tweet and /run can take a while; do not stall polling.
            let ctx = ctx.clone();
            tokio::spawn(async move {
                match cmd {
                    Command::Trending => ctx.reply(msg.chat.id, "🔍 Fetching trending topics...").await,
                    Command::Tweet => ctx.reply(msg.chat.id, "✍️ Drafting posts...").await,
                    _ => {}
                }
                let text = ctx.handle(msg.chat.id, cmd).await;
                ctx.reply(msg.chat.id, &text).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use crate::ingest::types::SourceKind;
    use crate::job::RunReport;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/trending now please"), Some(Command::Trending));
        assert_eq!(Command::parse("/Subscribe@TrendScoutBot"), Some(Command::Subscribe));
        assert_eq!(Command::parse("  /run"), Some(Command::Run));
    }

    #[test]
    fn unknown_and_plain_text() {
        assert_eq!(Command::parse("/tweet"), Some(Command::Tweet));
        assert_eq!(Command::parse("/post"), Some(Command::Unknown("post".into())));
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn trending_list_is_numbered() {
        let t = CandidateTopic {
            title: "Oscar nominations".into(),
            source: SourceKind::News,
            url: None,
            description: None,
            engagement: None,
            category: "entertainment".into(),
        };
        let out = render_trending(&[t]);
        assert!(out.contains("1. Oscar nominations (entertainment, news)"));
        assert!(render_trending(&[]).contains("Unable to fetch"));
    }

    #[test]
    fn drafts_are_numbered() {
        let out = render_drafts(&[
            ("Oscar night".into(), "Big night! #Oscars".into()),
            ("Senate vote".into(), "Tight count tonight".into()),
        ]);
        assert!(out.contains("1. Oscar night\nBig night! #Oscars"));
        assert!(out.contains("2. Senate vote\nTight count tonight"));
        assert!(render_drafts(&[]).contains("Unable to fetch"));
    }

    #[test]
    fn trigger_replies() {
        assert!(render_trigger(&TriggerOutcome::Busy).contains("already in progress"));
        let done = TriggerOutcome::Completed(Ok(RunReport {
            execution: 2,
            trends: 5,
            novel: 2,
            processed: 2,
            ..RunReport::default()
        }));
        assert_eq!(
            render_trigger(&done),
            "✅ Run #2 finished: 5 trends, 2 new, 2 sent, 0 failed."
        );
        let failed = TriggerOutcome::Completed(Err(RunError::NoTrends));
        assert!(render_trigger(&failed).starts_with("❌ No trends found"));
    }
}
