// src/job.rs
//! One pipeline run: gather → novelty filter → per-topic link, suggestion, delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{ProcessError, RunError};
use crate::ingest::types::{CandidateTopic, SourceKind};
use crate::ingest::TrendAggregator;
use crate::notify::{DynDelivery, Suggestion};
use crate::novelty::SeenHistory;
use crate::suggest::DynGenerator;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("job_runs_total", "Pipeline executions.");
        describe_counter!("job_topics_processed_total", "Topics delivered.");
        describe_counter!("job_topics_failed_total", "Topics skipped after an error.");
        describe_counter!("job_no_trends_total", "Runs that found no trends at all.");
        describe_gauge!("job_last_run_ts", "Unix timestamp of the last pipeline run.");
    });
}

/// Engagement link for a topic: the native url for aggregator/news items,
/// a social search for social trends, a news search otherwise.
pub fn resolve_link(topic: &CandidateTopic) -> Result<String, ProcessError> {
    let title = topic.title.trim();
    if title.is_empty() {
        return Err(ProcessError::Link("topic has an empty title".into()));
    }
    let q = urlencoding::encode(title);
    let link = match (topic.source, topic.url.as_deref()) {
        (SourceKind::Aggregator | SourceKind::News, Some(url)) => url.to_string(),
        (SourceKind::Social, _) => format!("https://twitter.com/search?q={q}&src=trend_click"),
        _ => format!("https://www.google.com/search?q={q}&tbm=nws"),
    };
    Ok(link)
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub execution: u64,
    pub fetched: usize,
    pub trends: usize,
    pub novel: usize,
    pub processed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct JobSettings {
    pub max_topics_per_run: usize,
    pub pacing: Duration,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_topics_per_run: 3,
            pacing: Duration::from_secs(3),
        }
    }
}

impl JobSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            max_topics_per_run: cfg.pipeline.max_topics_per_run,
            pacing: Duration::from_millis(cfg.pipeline.pacing_delay_ms),
        }
    }
}

/// The orchestrator. Owns the seen-topics history; runs must not overlap
/// (see `scheduler::SharedJob`).
pub struct TrendJob {
    aggregator: Arc<TrendAggregator>,
    generator: DynGenerator,
    delivery: DynDelivery,
    history: SeenHistory,
    settings: JobSettings,
    executions: u64,
}

impl TrendJob {
    pub fn new(
        aggregator: Arc<TrendAggregator>,
        generator: DynGenerator,
        delivery: DynDelivery,
        history: SeenHistory,
        settings: JobSettings,
    ) -> Self {
        Self {
            aggregator,
            generator,
            delivery,
            history,
            settings,
            executions: 0,
        }
    }

    pub fn history(&self) -> &SeenHistory {
        &self.history
    }

    pub fn executions(&self) -> u64 {
        self.executions
    }

    pub async fn execute(&mut self) -> Result<RunReport, RunError> {
        ensure_metrics_described();
        self.executions += 1;
        counter!("job_runs_total").increment(1);
        gauge!("job_last_run_ts").set(Utc::now().timestamp() as f64);
        info!(execution = self.executions, "starting trending job");

        let agg = self.aggregator.aggregate().await;
        let trends = agg.merge.topics;
        let mut report = RunReport {
            execution: self.executions,
            fetched: agg.fetched,
            trends: trends.len(),
            ..RunReport::default()
        };

        if trends.is_empty() {
            counter!("job_no_trends_total").increment(1);
            warn!(fetched = agg.fetched, "no trends found from any source");
            let err = RunError::NoTrends;
            self.delivery.send_error(&err.to_string()).await;
            return Err(err);
        }

        let novel = self.history.filter_novel(&trends);
        report.novel = novel.len();
        if novel.is_empty() {
            info!(trends = trends.len(), "no new trends since last check");
            return Ok(report);
        }

        let batch = novel.len().min(self.settings.max_topics_per_run);
        info!(novel = novel.len(), processing = batch, "processing new trends");

        for topic in novel.into_iter().take(batch) {
            match self.process(&topic).await {
                Ok(()) => {
                    self.history.mark_seen(&topic.title);
                    report.processed += 1;
                    counter!("job_topics_processed_total").increment(1);
                    info!(topic = %topic.title, "processed trend");
                }
                Err(e) => {
                    report.failed += 1;
                    counter!("job_topics_failed_total").increment(1);
                    warn!(topic = %topic.title, error = %e, "skipping trend");
                }
            }
            if !self.settings.pacing.is_zero() {
                tokio::time::sleep(self.settings.pacing).await;
            }
        }

        info!(?report, "trending job completed");
        Ok(report)
    }

    async fn process(&self, topic: &CandidateTopic) -> Result<(), ProcessError> {
        debug!(topic = %topic.title, source = %topic.source, "processing trend");
        let link = resolve_link(topic)?;
        let context = topic.description.as_deref().unwrap_or(&topic.title);
        let text = self.generator.generate(&topic.title, context).await?;

        let suggestion = Suggestion {
            title: topic.title.clone(),
            source: topic.source,
            link,
            text,
            generated_at: Utc::now(),
        };
        self.delivery.send_suggestion(&suggestion).await;
        Ok(())
    }
}
