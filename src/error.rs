// src/error.rs
//! Error taxonomy for the trend pipeline.
//!
//! Every error here is recoverable at the boundary that produces it: sources
//! degrade to empty output, generation falls back to templates, a failed topic
//! is skipped, and a run with no trends is reported once and then ends.

use thiserror::Error;

/// A single source could not produce candidates.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{source_name}: request failed: {message}")]
    Http {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name}: upstream returned HTTP {status}")]
    Status { source_name: &'static str, status: u16 },

    /// Upstream payload did not have the expected shape.
    #[error("{source_name}: parse error: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },

    /// Upstream answered with an explicit error payload.
    #[error("{source_name}: upstream error: {message}")]
    Upstream {
        source_name: &'static str,
        message: String,
    },
}

impl FetchError {
    pub fn parse(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name,
            message: message.into(),
        }
    }

    pub fn http(source_name: &'static str, err: &reqwest::Error) -> Self {
        Self::Http {
            source_name,
            message: err.to_string(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(String),

    #[error("generation API returned HTTP {0}")]
    Status(u16),

    #[error("generation response malformed: {0}")]
    Malformed(String),

    #[error("generation returned empty content")]
    Empty,
}

/// Whole-run failure; reported once to the delivery error channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("No trends found from any source. Check if services are accessible.")]
    NoTrends,
}

/// Failure while processing one topic. The topic is skipped and left unseen.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot build engagement link: {0}")]
    Link(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Transport failure inside a delivery implementation. Never leaves it.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected with HTTP {status}: {description}")]
    Rejected { status: u16, description: String },
}

impl DeliveryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
