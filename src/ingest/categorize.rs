// src/ingest/categorize.rs
//! Keyword taxonomy. Categories are checked in list order and the first one
//! with a matching keyword wins, so order is part of the configuration.

use serde::{Deserialize, Serialize};

pub const OTHER: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Built-in taxonomy used when the config file has no `[[categories]]`.
pub fn default_taxonomy() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "entertainment",
            &[
                "movie",
                "celebrity",
                "hollywood",
                "music",
                "film",
                "actor",
                "actress",
                "oscar",
                "grammy",
                "netflix",
                "disney",
                "marvel",
                "star wars",
                "beyonce",
                "taylor swift",
                "kardashian",
            ],
        ),
        CategoryRule::new(
            "gossip",
            &[
                "rumor", "scandal", "affair", "breakup", "dating", "relationship", "cheating",
                "divorce", "feud", "beef", "drama", "leak", "secret",
            ],
        ),
        CategoryRule::new(
            "politics",
            &[
                "biden",
                "trump",
                "congress",
                "senate",
                "election",
                "democrat",
                "republican",
                "policy",
                "white house",
                "government",
                "bill",
                "law",
                "vote",
                "campaign",
            ],
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<CategoryRule>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(default_taxonomy())
    }
}

impl Categorizer {
    /// Keywords are lower-cased here so matching stays case-insensitive
    /// whatever the config spelled.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| CategoryRule {
                name: r.name,
                keywords: r
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn categorize(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|r| r.name.clone())
            .unwrap_or_else(|| OTHER.to_string())
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}
