// src/ingest/fallback.rs
use async_trait::async_trait;
use metrics::counter;

use crate::error::FetchError;
use crate::ingest::types::{CandidateTopic, TrendSource};

/// Source that substitutes another source's output when its primary fails.
///
/// The fallback's candidates keep their own `source` tag. An empty but
/// successful primary result is returned as-is.
pub struct FallbackSource {
    primary: Box<dyn TrendSource>,
    fallback: Box<dyn TrendSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn TrendSource>, fallback: Box<dyn TrendSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TrendSource for FallbackSource {
    async fn fetch(&self) -> Result<Vec<CandidateTopic>, FetchError> {
        match self.primary.fetch().await {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    error = %e,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "primary source failed, using fallback"
                );
                counter!("ingest_fallback_total", "source" => self.primary.name()).increment(1);
                self.fallback.fetch().await
            }
        }
    }

    fn name(&self) -> &'static str {
        self.primary.name()
    }
}
