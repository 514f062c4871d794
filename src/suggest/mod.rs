//! Short-post suggestion generation: an external chat-completions provider
//! with a local template fallback, so topic processing never blocks on it.

pub mod chat;
pub mod template;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use crate::config::GenerationConfig;
use crate::error::GenerationError;

pub use chat::ChatCompletionGenerator;
pub use template::TemplateGenerator;

/// Maximum length of a post, in characters.
pub const MAX_POST_CHARS: usize = 280;

#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate(&self, topic: &str, context: &str) -> Result<String, GenerationError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn SuggestionGenerator>;

/// Tries the external provider (if any) and falls back to templates on failure.
pub struct FallbackGenerator {
    primary: Option<DynGenerator>,
    fallback: TemplateGenerator,
}

impl FallbackGenerator {
    pub fn new(primary: Option<DynGenerator>) -> Self {
        Self {
            primary,
            fallback: TemplateGenerator,
        }
    }
}

#[async_trait]
impl SuggestionGenerator for FallbackGenerator {
    async fn generate(&self, topic: &str, context: &str) -> Result<String, GenerationError> {
        if let Some(p) = &self.primary {
            match p.generate(topic, context).await {
                Ok(s) => return Ok(s),
                Err(e) => {
                    tracing::warn!(error = %e, provider = p.name(), "generation failed, using template");
                    counter!("suggest_fallback_total").increment(1);
                }
            }
        }
        self.fallback.generate(topic, context).await
    }

    fn name(&self) -> &'static str {
        match &self.primary {
            Some(p) => p.name(),
            None => self.fallback.name(),
        }
    }
}

/// Factory: chat-completions with template fallback when an API key is set,
/// templates only otherwise.
pub fn build_generator(cfg: &GenerationConfig) -> DynGenerator {
    let primary: Option<DynGenerator> = match ChatCompletionGenerator::from_config(cfg) {
        Some(g) => Some(Arc::new(g)),
        None => {
            tracing::info!("no generation API key configured; using template suggestions");
            None
        }
    };
    Arc::new(FallbackGenerator::new(primary))
}

/// Single-line-safe trim, strip wrapping quotes, cap at 280 chars.
pub fn clean_suggestion(raw: &str) -> String {
    let mut s = raw.trim();
    for q in ['"', '\u{201C}', '\u{201D}'] {
        s = s.strip_prefix(q).unwrap_or(s);
        s = s.strip_suffix(q).unwrap_or(s);
    }
    truncate_post(s.trim())
}

/// Cap a post at 280 chars, marking the cut with "...".
pub fn truncate_post(s: &str) -> String {
    if s.chars().count() <= MAX_POST_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX_POST_CHARS - 3).collect();
    out.push_str("...");
    out
}
