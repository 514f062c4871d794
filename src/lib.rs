// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod ingest;
pub mod job;
pub mod metrics;
pub mod notify;
pub mod novelty;
pub mod scheduler;
pub mod suggest;

use std::sync::Arc;

use shuttle_axum::axum::Router;

pub use crate::config::AppConfig;
pub use crate::ingest::TrendAggregator;
pub use crate::job::{RunReport, TrendJob};
pub use crate::scheduler::SharedJob;

use crate::bot::BotContext;
use crate::ingest::categorize::Categorizer;
use crate::job::JobSettings;
use crate::notify::{build_delivery, SubscriberRegistry, TelegramClient};
use crate::novelty::SeenHistory;
use crate::suggest::build_generator;

/// Fully wired application: HTTP router plus the handles background tasks need.
pub struct App {
    pub router: Router,
    pub job: SharedJob,
    pub aggregator: Arc<TrendAggregator>,
    pub subscribers: SubscriberRegistry,
    /// Present when a bot token is set and command polling is enabled.
    pub bot: Option<BotContext>,
}

/// Build live sources, generator, delivery and the job from config.
pub fn build_app(cfg: &AppConfig) -> App {
    let categorizer = Arc::new(Categorizer::new(cfg.categories.clone()));
    let aggregator = Arc::new(TrendAggregator::from_config(cfg, categorizer));
    let subscribers = SubscriberRegistry::new();

    let generator = build_generator(&cfg.generation);
    let delivery = build_delivery(&cfg.telegram, subscribers.clone());
    let job = scheduler::share(TrendJob::new(
        aggregator.clone(),
        generator.clone(),
        delivery,
        SeenHistory::with_capacity(cfg.pipeline.history_cap),
        JobSettings::from_config(cfg),
    ));

    let bot = TelegramClient::from_config(&cfg.telegram)
        .filter(|_| cfg.telegram.poll_commands)
        .map(|client| BotContext {
            client,
            subscribers: subscribers.clone(),
            aggregator: aggregator.clone(),
            generator,
            job: job.clone(),
            operator_chat: cfg.telegram.chat_id,
        });

    let state = api::AppState::new(job.clone(), subscribers.clone(), cfg.generation.enabled());
    App {
        router: api::create_router(state),
        job,
        aggregator,
        subscribers,
        bot,
    }
}
