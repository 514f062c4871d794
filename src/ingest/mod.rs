// src/ingest/mod.rs
pub mod categorize;
pub mod fallback;
pub mod merge;
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::config::AppConfig;
use crate::ingest::categorize::Categorizer;
use crate::ingest::fallback::FallbackSource;
use crate::ingest::merge::{merge, MergeOutcome};
use crate::ingest::providers::{
    build_http_client, newsapi::NewsApiProvider, nitter::NitterProvider, reddit::RedditProvider,
};
use crate::ingest::types::{CandidateTopic, TrendSource};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Candidates parsed from sources.");
        describe_counter!(
            "ingest_kept_total",
            "Candidates kept after category filtering, dedup and truncation."
        );
        describe_counter!(
            "ingest_filtered_total",
            "Candidates dropped because their category is not allow-listed."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Candidates dropped as duplicate titles."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Source fetch/parse errors."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Times a fallback source replaced a failed primary."
        );
        describe_histogram!("ingest_parse_ms", "Source parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when trends were last gathered."
        );
    });
}

/// Clean upstream markup out of a title or description: decode entities,
/// strip tags, collapse whitespace, trim. Wording and punctuation are kept,
/// so the result is still the title's identity.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(&decoded, "");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

/// Fetch from one source; a failure is logged and degrades to an empty list.
pub async fn fetch_or_empty(source: &dyn TrendSource) -> Vec<CandidateTopic> {
    match source.fetch().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, provider = source.name(), "source failed");
            counter!("ingest_provider_errors_total", "source" => source.name()).increment(1);
            Vec::new()
        }
    }
}

/// Fetch all sources concurrently. Output order follows `sources`, not
/// completion order, so dedup stays deterministic.
pub async fn gather(sources: &[Box<dyn TrendSource>]) -> Vec<Vec<CandidateTopic>> {
    join_all(sources.iter().map(|s| fetch_or_empty(s.as_ref()))).await
}

/// Counts for one gather + merge pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    /// Candidates returned by all sources before merging.
    pub fetched: usize,
    pub merge: MergeOutcome,
}

/// Owns the ordered source list and merge settings.
pub struct TrendAggregator {
    sources: Vec<Box<dyn TrendSource>>,
    allowed: Vec<String>,
    max_trends: usize,
}

impl TrendAggregator {
    pub fn new(sources: Vec<Box<dyn TrendSource>>, allowed: Vec<String>, max_trends: usize) -> Self {
        Self {
            sources,
            allowed,
            max_trends,
        }
    }

    /// Wire the three live sources in their dedup order: social, news, aggregator.
    pub fn from_config(cfg: &AppConfig, categorizer: Arc<Categorizer>) -> Self {
        let timeout = Duration::from_secs(cfg.pipeline.fetch_timeout_secs);
        let client = build_http_client(timeout, &cfg.sources.user_agent);
        let src = &cfg.sources;

        let reddit = || -> Box<dyn TrendSource> {
            Box::new(RedditProvider::from_url(
                &src.aggregator_url,
                client.clone(),
                categorizer.clone(),
            ))
        };

        let social: Box<dyn TrendSource> = {
            let p = Box::new(NitterProvider::from_url(
                &src.social_url,
                client.clone(),
                categorizer.clone(),
            ));
            if src.social_fallback {
                Box::new(FallbackSource::new(p, reddit()))
            } else {
                p
            }
        };
        let news: Box<dyn TrendSource> = {
            let p = Box::new(NewsApiProvider::from_url(
                &src.news_url,
                src.news_api_key.clone(),
                client.clone(),
                categorizer.clone(),
            ));
            if src.news_fallback {
                Box::new(FallbackSource::new(p, reddit()))
            } else {
                p
            }
        };

        Self::new(
            vec![social, news, reddit()],
            cfg.pipeline.allowed_categories.clone(),
            cfg.pipeline.max_trends,
        )
    }

    pub async fn aggregate(&self) -> Aggregate {
        ensure_metrics_described();

        let lists = gather(&self.sources).await;
        let fetched = lists.iter().map(Vec::len).sum();
        let merged = merge(lists, &self.allowed, self.max_trends);

        counter!("ingest_kept_total").increment(merged.topics.len() as u64);
        counter!("ingest_filtered_total").increment(merged.filtered as u64);
        counter!("ingest_dedup_total").increment(merged.deduped as u64);
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        gauge!("ingest_pipeline_last_run_ts").set(now as f64);

        tracing::info!(
            target: "ingest",
            fetched,
            kept = merged.topics.len(),
            filtered = merged.filtered,
            dedup = merged.deduped,
            "trends gathered"
        );

        Aggregate {
            fetched,
            merge: merged,
        }
    }

    /// Merged, ranked trend set for one run.
    pub async fn get_all_trends(&self) -> Vec<CandidateTopic> {
        self.aggregate().await.merge.topics
    }
}
