// src/ingest/providers/mod.rs
pub mod newsapi;
pub mod nitter;
pub mod reddit;

use std::time::Duration;

use metrics::{counter, histogram};

use crate::error::FetchError;

/// Where a provider reads its payload from.
pub(crate) enum Mode {
    // Owned copy so tests can pass any &str.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

/// Shared client for all sources. The timeout bounds every call made with it.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "http client builder failed, using defaults");
            reqwest::Client::new()
        })
}

/// GET a URL and return the body, mapping transport and status failures.
pub(crate) async fn get_body(
    request: reqwest::RequestBuilder,
    source_name: &'static str,
) -> Result<String, FetchError> {
    let resp = request.send().await.map_err(|e| {
        tracing::warn!(target: "ingest", error = %e, provider = source_name, "provider http error");
        FetchError::http(source_name, &e)
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            source_name,
            status: status.as_u16(),
        });
    }
    resp.text()
        .await
        .map_err(|e| FetchError::http(source_name, &e))
}

/// Record parse telemetry shared by all providers.
pub(crate) fn record_parse(t0: std::time::Instant, source_name: &'static str, produced: usize) {
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms", "source" => source_name).record(ms);
    counter!("ingest_events_total", "source" => source_name).increment(produced as u64);
}
