// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_API_URL: &str = "DEEPSEEK_API_URL";

fn default_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_max_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}

/// Settings for the chat-completions suggestion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Full `/chat/completions` endpoint (OpenAI-compatible).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Clamped to 0.0..=2.0.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Env only; never read from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl GenerationConfig {
    /// Resolve the API key and endpoint override from the environment.
    /// Placeholder keys ("free_tier", blank) count as absent.
    pub fn apply_env(&mut self) {
        self.api_key = env::var(ENV_API_KEY)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !k.eq_ignore_ascii_case("free_tier"));

        if let Ok(url) = env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
    }

    pub fn sanitize(&mut self) {
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let mut cfg = GenerationConfig {
            temperature: 7.5,
            max_tokens: 0,
            timeout_secs: 0,
            ..GenerationConfig::default()
        };
        cfg.sanitize();
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.max_tokens, 150);
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[serial_test::serial]
    #[test]
    fn placeholder_key_counts_as_disabled() {
        env::set_var(ENV_API_KEY, "free_tier");
        let mut cfg = GenerationConfig::default();
        cfg.apply_env();
        assert!(!cfg.enabled());

        env::set_var(ENV_API_KEY, "sk-test");
        cfg.apply_env();
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        env::remove_var(ENV_API_KEY);
    }
}
