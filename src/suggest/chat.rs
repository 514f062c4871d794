// src/suggest/chat.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{clean_suggestion, SuggestionGenerator};
use crate::config::GenerationConfig;
use crate::error::GenerationError;

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

/// OpenAI-compatible chat completions (DeepSeek by default).
pub struct ChatCompletionGenerator {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionGenerator {
    /// `None` when no API key is configured.
    pub fn from_config(cfg: &GenerationConfig) -> Option<Self> {
        let api_key = cfg.api_key.clone()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("trend-scout/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .ok()?;
        Some(Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key,
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }

    pub fn build_prompt(topic: &str, context: &str) -> String {
        format!(
            "Create an engaging tweet about: \"{topic}\"\n\
             Context: \"{context}\"\n\n\
             Requirements:\n\
             - Maximum 280 characters\n\
             - Engaging and attention-grabbing\n\
             - Include relevant hashtags\n\
             - Suitable for Twitter audience\n\
             - Return ONLY the tweet text"
        )
    }

    /// Pull the first choice's text out of a response body.
    pub fn parse_response(body: &str) -> Result<String, GenerationError> {
        let resp: Resp =
            serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::Malformed("no choices".into()))?;
        let cleaned = clean_suggestion(&content);
        if cleaned.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(cleaned)
    }
}

#[async_trait]
impl SuggestionGenerator for ChatCompletionGenerator {
    async fn generate(&self, topic: &str, context: &str) -> Result<String, GenerationError> {
        let prompt = Self::build_prompt(topic, context);
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_key() {
        assert!(ChatCompletionGenerator::from_config(&GenerationConfig::default()).is_none());
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  \"Big night at the Oscars! #Oscars\" "}}]}"#;
        assert_eq!(
            ChatCompletionGenerator::parse_response(body).unwrap(),
            "Big night at the Oscars! #Oscars"
        );
    }

    #[test]
    fn empty_or_malformed_content_is_an_error() {
        let empty = r#"{"choices":[{"message":{"content":"   "}}]}"#;
        assert!(matches!(
            ChatCompletionGenerator::parse_response(empty),
            Err(GenerationError::Empty)
        ));
        assert!(matches!(
            ChatCompletionGenerator::parse_response(r#"{"choices":[]}"#),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            ChatCompletionGenerator::parse_response("<html>"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn prompt_carries_topic_and_context() {
        let p = ChatCompletionGenerator::build_prompt("Oscar night", "Best picture upset");
        assert!(p.contains("\"Oscar night\""));
        assert!(p.contains("Context: \"Best picture upset\""));
    }
}
