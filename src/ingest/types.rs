// src/ingest/types.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::ingest::categorize::Categorizer;

/// Which upstream platform produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Social front-end trend list (Nitter).
    Social,
    /// News headlines API.
    News,
    /// Link aggregator front page (Reddit).
    Aggregator,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Social => "social",
            SourceKind::News => "news",
            SourceKind::Aggregator => "aggregator",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateTopic {
    pub title: String, // trimmed, non-empty
    pub source: SourceKind,
    pub url: Option<String>,
    pub description: Option<String>,
    pub engagement: Option<f64>,
    pub category: String,
}

impl CandidateTopic {
    /// Build a candidate and compute its category from the title.
    /// Returns `None` when the title is blank after trimming.
    pub fn categorized(
        title: impl AsRef<str>,
        source: SourceKind,
        categorizer: &Categorizer,
    ) -> Option<Self> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            category: categorizer.categorize(title),
            title: title.to_string(),
            source,
            url: None,
            description: None,
            engagement: None,
        })
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Negative or non-finite scores are dropped.
    pub fn with_engagement(mut self, score: Option<f64>) -> Self {
        self.engagement = score.filter(|s| s.is_finite() && *s >= 0.0);
        self
    }

    /// Identity key used by dedup and novelty checks.
    pub fn key(&self) -> String {
        title_key(&self.title)
    }

    /// Ranking score; absent counts as zero.
    pub fn score(&self) -> f64 {
        self.engagement.unwrap_or(0.0)
    }
}

/// Case-folded title used for identity comparisons.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// One upstream platform. Implementations surface their failures as
/// `FetchError`; callers decide whether to degrade or fall back.
#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CandidateTopic>, FetchError>;
    fn name(&self) -> &'static str;
}
