// src/ingest/providers/reddit.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{get_body, record_parse, Mode};
use crate::error::FetchError;
use crate::ingest::categorize::Categorizer;
use crate::ingest::normalize_text;
use crate::ingest::types::{CandidateTopic, SourceKind, TrendSource};

const NAME: &str = "aggregator";
const MAX_POSTS: usize = 20;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}
#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}
#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}
#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    permalink: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    num_comments: Option<f64>,
}

/// Link-aggregator front page (`/r/popular.json`).
/// Engagement is votes plus comments.
pub struct RedditProvider {
    mode: Mode,
    categorizer: Arc<Categorizer>,
}

impl RedditProvider {
    pub fn from_fixture_str(s: &str, categorizer: Arc<Categorizer>) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            categorizer,
        }
    }

    pub fn from_url(url: &str, client: reqwest::Client, categorizer: Arc<Categorizer>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
            categorizer,
        }
    }

    pub fn parse(body: &str, categorizer: &Categorizer) -> Result<Vec<CandidateTopic>, FetchError> {
        let t0 = std::time::Instant::now();
        let listing: Listing =
            serde_json::from_str(body).map_err(|e| FetchError::parse(NAME, e.to_string()))?;

        let mut out = Vec::with_capacity(MAX_POSTS);
        for child in listing.data.children.into_iter().take(MAX_POSTS) {
            let post = child.data;
            let title = normalize_text(post.title.as_deref().unwrap_or_default());
            let Some(topic) = CandidateTopic::categorized(&title, SourceKind::Aggregator, categorizer)
            else {
                continue;
            };
            let url = post
                .permalink
                .filter(|p| !p.is_empty())
                .map(|p| format!("https://reddit.com{p}"));
            let engagement = match (post.score, post.num_comments) {
                (None, None) => None,
                (s, c) => Some(s.unwrap_or(0.0) + c.unwrap_or(0.0)),
            };
            out.push(topic.with_url(url).with_engagement(engagement));
        }

        record_parse(t0, NAME, out.len());
        Ok(out)
    }
}

#[async_trait]
impl TrendSource for RedditProvider {
    async fn fetch(&self) -> Result<Vec<CandidateTopic>, FetchError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse(s, &self.categorizer),
            Mode::Http { url, client } => {
                let body = get_body(client.get(url.as_str()), NAME).await?;
                Self::parse(&body, &self.categorizer)
            }
        }
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
