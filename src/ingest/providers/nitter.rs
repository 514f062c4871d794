// src/ingest/providers/nitter.rs
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{get_body, record_parse, Mode};
use crate::error::FetchError;
use crate::ingest::categorize::Categorizer;
use crate::ingest::normalize_text;
use crate::ingest::types::{CandidateTopic, SourceKind, TrendSource};

const NAME: &str = "social";
const MAX_ITEMS: usize = 10;

static TREND_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".trend-item").expect("static selector"));
static TREND_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".trend-name").expect("static selector"));

/// Social front-end trend sidebar, scraped from HTML.
/// Trends carry only a name: no link, no score.
pub struct NitterProvider {
    mode: Mode,
    categorizer: Arc<Categorizer>,
}

impl NitterProvider {
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

    /// A page without any `.trend-item` means the markup changed (or we got a
    /// captcha/interstitial), which is reported as a parse error.
    pub fn parse(html: &str, categorizer: &Categorizer) -> Result<Vec<CandidateTopic>, FetchError> {
        let t0 = std::time::Instant::now();
        let doc = Html::parse_document(html);

        let items: Vec<_> = doc.select(&TREND_ITEM).take(MAX_ITEMS).collect();
        if items.is_empty() {
            return Err(FetchError::parse(NAME, "no .trend-item elements in page"));
        }

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Some(name) = item.select(&TREND_NAME).next() else {
                continue;
            };
            let text: String = name.text().collect();
            let title = normalize_text(&text);
            if let Some(topic) = CandidateTopic::categorized(&title, SourceKind::Social, categorizer) {
                out.push(topic);
            }
        }

        record_parse(t0, NAME, out.len());
        Ok(out)
    }
}

#[async_trait]
impl TrendSource for NitterProvider {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_trend_names_and_caps_at_ten() {
        let mut html = String::from("<html><body><ul>");
        for i in 0..12 {
            html.push_str(&format!(
                r#"<li class="trend-item"><span class="trend-name"> Trump rally {i} </span></li>"#
            ));
        }
        html.push_str("</ul></body></html>");

        let out = NitterProvider::parse(&html, &Categorizer::default()).unwrap();
        assert_eq!(out.len(), 10);
        assert_eq!(out[0].title, "Trump rally 0");
        assert_eq!(out[0].category, "politics");
        assert!(out.iter().all(|t| t.source == SourceKind::Social && t.url.is_none()));
    }

    #[test]
    fn page_without_trends_is_parse_error() {
        let err = NitterProvider::parse("<html><body>Verifying your browser</body></html>", &Categorizer::default())
            .unwrap_err();
        assert!(err.is_parse());
    }
}
