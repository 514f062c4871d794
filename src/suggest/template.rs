// src/suggest/template.rs
use async_trait::async_trait;
use rand::Rng;

use super::{truncate_post, SuggestionGenerator};
use crate::error::GenerationError;

const TOPIC_MAX_CHARS: usize = 100;

const TEMPLATES: [&str; 5] = [
    "🔥 Hot topic: {topic}\n\nWhat are your thoughts on this? 💬\n\n#Trending #News",
    "🚨 Breaking: {topic}\n\nThis is getting a lot of attention right now! 👀\n\nWhat's your take?",
    "📊 Trending now: {topic}\n\nThe internet is buzzing about this! 🐝\n\nJoin the conversation!",
    "💡 Big discussion: {topic}\n\nEveryone's talking about this today! 🗣️\n\nWhere do you stand?",
    "🌟 Hot take: {topic}\n\nThis story is blowing up! 💥\n\nWhat's your opinion? #HotTopic",
];

/// Offline generator: fills a random template with the topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn template_count() -> usize {
        TEMPLATES.len()
    }

    /// Render template `index` (wrapped) for `topic`.
    pub fn render(index: usize, topic: &str) -> String {
        let topic: String = topic.trim().chars().take(TOPIC_MAX_CHARS).collect();
        let tpl = TEMPLATES[index % TEMPLATES.len()];
        truncate_post(&tpl.replace("{topic}", &topic))
    }
}

fn pick_index() -> usize {
    rand::rng().random_range(0..TEMPLATES.len())
}

#[async_trait]
impl SuggestionGenerator for TemplateGenerator {
    async fn generate(&self, topic: &str, _context: &str) -> Result<String, GenerationError> {
        Ok(Self::render(pick_index(), topic))
    }

    fn name(&self) -> &'static str {
        "template"
    }
}
