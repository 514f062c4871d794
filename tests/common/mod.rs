// tests/common/mod.rs
// Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use trend_scout::error::{FetchError, GenerationError};
use trend_scout::ingest::categorize::Categorizer;
use trend_scout::ingest::providers::{newsapi::NewsApiProvider, nitter::NitterProvider, reddit::RedditProvider};
use trend_scout::ingest::types::{CandidateTopic, SourceKind, TrendSource};
use trend_scout::ingest::TrendAggregator;
use trend_scout::job::{JobSettings, TrendJob};
use trend_scout::notify::{Delivery, Suggestion};
use trend_scout::novelty::SeenHistory;
use trend_scout::suggest::SuggestionGenerator;

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

pub fn allowed() -> Vec<String> {
    vec!["entertainment".into(), "gossip".into(), "politics".into()]
}

pub fn topic(title: &str, source: SourceKind, engagement: Option<f64>, category: &str) -> CandidateTopic {
    CandidateTopic {
        title: title.into(),
        source,
        url: None,
        description: None,
        engagement,
        category: category.into(),
    }
}

/// Returns a fixed list, or fails when `fail` is set.
pub struct StaticSource {
    pub name: &'static str,
    pub topics: Vec<CandidateTopic>,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn ok(name: &'static str, topics: Vec<CandidateTopic>) -> Self {
        Self {
            name,
            topics,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            topics: Vec::new(),
            fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TrendSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<CandidateTopic>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Status {
                source_name: self.name,
                status: 503,
            });
        }
        Ok(self.topics.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Deterministic generator that counts calls and can fail for chosen titles.
#[derive(Default)]
pub struct CountingGenerator {
    pub calls: AtomicUsize,
    pub fail_for: Vec<String>,
}

impl CountingGenerator {
    pub fn failing_for(titles: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_for: titles.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SuggestionGenerator for CountingGenerator {
    async fn generate(&self, topic: &str, _context: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.iter().any(|t| t == topic) {
            return Err(GenerationError::Status(500));
        }
        Ok(format!("Post about {topic}"))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Captures everything the job delivers.
#[derive(Default)]
pub struct RecordingDelivery {
    pub suggestions: Mutex<Vec<Suggestion>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingDelivery {
    pub fn titles(&self) -> Vec<String> {
        self.suggestions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.title.clone())
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_suggestion(&self, suggestion: &Suggestion) {
        self.suggestions.lock().unwrap().push(suggestion.clone());
    }

    async fn send_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// The three live source kinds, reading the checked-in fixtures, in dedup order.
pub fn fixture_sources() -> Vec<Box<dyn TrendSource>> {
    let cat = Arc::new(Categorizer::default());
    vec![
        Box::new(NitterProvider::from_fixture_str(&fixture("nitter_home.html"), cat.clone())),
        Box::new(NewsApiProvider::from_fixture_str(&fixture("newsapi_top.json"), cat.clone())),
        Box::new(RedditProvider::from_fixture_str(&fixture("reddit_popular.json"), cat)),
    ]
}

pub struct Harness {
    pub job: TrendJob,
    pub generator: Arc<CountingGenerator>,
    pub delivery: Arc<RecordingDelivery>,
}

pub fn harness(
    sources: Vec<Box<dyn TrendSource>>,
    generator: CountingGenerator,
    history_cap: usize,
    max_topics_per_run: usize,
) -> Harness {
    let aggregator = Arc::new(TrendAggregator::new(sources, allowed(), 15));
    let generator = Arc::new(generator);
    let delivery = Arc::new(RecordingDelivery::default());
    let job = TrendJob::new(
        aggregator,
        generator.clone(),
        delivery.clone(),
        SeenHistory::with_capacity(history_cap),
        JobSettings {
            max_topics_per_run,
            pacing: Duration::ZERO,
        },
    );
    Harness {
        job,
        generator,
        delivery,
    }
}
