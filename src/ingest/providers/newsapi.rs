// src/ingest/providers/newsapi.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{get_body, record_parse, Mode};
use crate::error::FetchError;
use crate::ingest::categorize::Categorizer;
use crate::ingest::normalize_text;
use crate::ingest::types::{CandidateTopic, SourceKind, TrendSource};

const NAME: &str = "news";
const PAGE_SIZE: &str = "20";
/// NewsAPI accepts "demo" for a handful of unauthenticated calls.
const DEMO_KEY: &str = "demo";

#[derive(Debug, Deserialize)]
struct Response {
    status: Option<String>,
    message: Option<String>,
    articles: Option<Vec<Article>>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

/// Top US headlines. Articles carry a url and description but no score.
pub struct NewsApiProvider {
    mode: Mode,
    api_key: String,
    categorizer: Arc<Categorizer>,
}

impl NewsApiProvider {
    pub fn from_fixture_str(s: &str, categorizer: Arc<Categorizer>) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            api_key: DEMO_KEY.to_string(),
            categorizer,
        }
    }

    pub fn from_url(
        url: &str,
        api_key: Option<String>,
        client: reqwest::Client,
        categorizer: Arc<Categorizer>,
    ) -> Self {
        Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
            api_key: api_key.unwrap_or_else(|| DEMO_KEY.to_string()),
            categorizer,
        }
    }

    pub fn parse(body: &str, categorizer: &Categorizer) -> Result<Vec<CandidateTopic>, FetchError> {
        let t0 = std::time::Instant::now();
        let resp: Response =
            serde_json::from_str(body).map_err(|e| FetchError::parse(NAME, e.to_string()))?;

        if resp.status.as_deref() == Some("error") {
            return Err(FetchError::Upstream {
                source_name: NAME,
                message: resp.message.unwrap_or_else(|| "unknown error".into()),
            });
        }
        let articles = resp
            .articles
            .ok_or_else(|| FetchError::parse(NAME, "missing `articles`"))?;

        let mut out = Vec::with_capacity(articles.len());
        for a in articles {
            let title = normalize_text(a.title.as_deref().unwrap_or_default());
            if let Some(topic) = CandidateTopic::categorized(&title, SourceKind::News, categorizer) {
                let description = a.description.map(|d| normalize_text(&d));
                out.push(topic.with_url(a.url).with_description(description));
            }
        }

        record_parse(t0, NAME, out.len());
        Ok(out)
    }
}

#[async_trait]
impl TrendSource for NewsApiProvider {
    async fn fetch(&self) -> Result<Vec<CandidateTopic>, FetchError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse(s, &self.categorizer),
            Mode::Http { url, client } => {
                let req = client.get(url.as_str()).query(&[
                    ("country", "us"),
                    ("pageSize", PAGE_SIZE),
                    ("apiKey", self.api_key.as_str()),
                ]);
                let body = get_body(req, NAME).await?;
                Self::parse(&body, &self.categorizer)
            }
        }
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_is_upstream_error() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let err = NewsApiProvider::parse(body, &Categorizer::default()).unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
        assert!(err.to_string().contains("Your API key is invalid"));
    }

    #[test]
    fn missing_articles_is_parse_error() {
        let err = NewsApiProvider::parse(r#"{"status":"ok"}"#, &Categorizer::default())
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn articles_keep_url_and_description() {
        let body = r#"{"status":"ok","articles":[
            {"title":"Congress passes &amp; signs bill","url":"https://n.example/1","description":"<p>Late vote</p>"},
            {"title":null,"url":"https://n.example/2"}
        ]}"#;
        let out = NewsApiProvider::parse(body, &Categorizer::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Congress passes & signs bill");
        assert_eq!(out[0].description.as_deref(), Some("Late vote"));
        assert_eq!(out[0].category, "politics");
        assert_eq!(out[0].engagement, None);
    }
}
