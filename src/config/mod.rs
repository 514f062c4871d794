// src/config/mod.rs
//! Application configuration: `config/trends.toml` plus secrets from the environment.

pub mod ai;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::ingest::categorize::{default_taxonomy, CategoryRule};

pub use ai::GenerationConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/trends.toml";
pub const ENV_CONFIG_PATH: &str = "TRENDS_CONFIG_PATH";

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";

/// Accepted per-fetch timeout range in seconds.
const FETCH_TIMEOUT_RANGE: (u64, u64) = (5, 15);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    /// Ordered: the first matching category wins.
    pub categories: Vec<CategoryRule>,
    pub sources: SourcesConfig,
    pub schedule: ScheduleConfig,
    pub generation: GenerationConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub allowed_categories: Vec<String>,
    /// Size cap of the merged trend set.
    pub max_trends: usize,
    pub max_topics_per_run: usize,
    pub pacing_delay_ms: u64,
    pub history_cap: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_categories: vec![
                "entertainment".into(),
                "gossip".into(),
                "politics".into(),
            ],
            max_trends: 15,
            max_topics_per_run: 3,
            pacing_delay_ms: 3_000,
            history_cap: 100,
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub social_url: String,
    pub news_url: String,
    pub aggregator_url: String,
    pub user_agent: String,
    /// Substitute aggregator output when the social front-end fails.
    pub social_fallback: bool,
    /// Substitute aggregator output when the news API fails.
    pub news_fallback: bool,
    /// Env only (`NEWS_API_KEY`).
    #[serde(skip)]
    pub news_api_key: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            social_url: "https://nitter.net/".into(),
            news_url: "https://newsapi.org/v2/top-headlines".into(),
            aggregator_url: "https://www.reddit.com/r/popular.json".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            social_fallback: true,
            news_fallback: true,
            news_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Fixed cadence between runs when `daily_hour_utc` is unset.
    pub interval_secs: u64,
    /// Run once a day at this UTC hour (0..=23) instead of a fixed interval.
    pub daily_hour_utc: Option<u32>,
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 6 * 3600,
            daily_hour_utc: None,
            run_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub timeout_secs: u64,
    pub max_retries: u8,
    /// Long-poll `getUpdates` for bot commands.
    pub poll_commands: bool,
    #[serde(skip)]
    pub bot_token: Option<String>,
    #[serde(skip)]
    pub chat_id: Option<i64>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            timeout_secs: 10,
            max_retries: 3,
            poll_commands: true,
            bot_token: None,
            chat_id: None,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document, apply defaults and sanitize. Does not read env.
    pub fn from_toml_str(s: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut cfg: AppConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        cfg.finish()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load using env var + fallbacks, then resolve secrets from the environment:
    /// 1) $TRENDS_CONFIG_PATH
    /// 2) config/trends.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(ConfigError::Invalid(format!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    )));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from(&p)?
                } else {
                    let mut d = Self::default();
                    d.finish()?;
                    d
                }
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        self.generation.apply_env();

        self.sources.news_api_key = std::env::var(ENV_NEWS_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty());

        self.telegram.bot_token = std::env::var(ENV_TELEGRAM_TOKEN)
            .ok()
            .filter(|t| !t.trim().is_empty());
        self.telegram.chat_id = std::env::var(ENV_TELEGRAM_CHAT_ID)
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok());
    }

    fn finish(&mut self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            self.categories = default_taxonomy();
        }
        for rule in &mut self.categories {
            rule.name = rule.name.trim().to_lowercase();
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if rule.name.is_empty() {
                return Err(ConfigError::Invalid("category with empty name".into()));
            }
        }

        let p = &mut self.pipeline;
        p.allowed_categories = p
            .allowed_categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        let (lo, hi) = FETCH_TIMEOUT_RANGE;
        p.fetch_timeout_secs = p.fetch_timeout_secs.clamp(lo, hi);
        p.history_cap = p.history_cap.max(1);
        if p.max_trends == 0 {
            return Err(ConfigError::Invalid("pipeline.max_trends must be > 0".into()));
        }

        if let Some(h) = self.schedule.daily_hour_utc {
            if h > 23 {
                return Err(ConfigError::Invalid(format!(
                    "schedule.daily_hour_utc must be 0..=23, got {h}"
                )));
            }
        }
        self.schedule.interval_secs = self.schedule.interval_secs.max(60);

        self.generation.sanitize();
        Ok(())
    }
}
