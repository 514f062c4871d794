// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

mod common;

use common::*;
use trend_scout::metrics::Metrics;

// The recorder is process-global, so everything lives in one test.
#[tokio::test]
async fn metrics_endpoint_exposes_pipeline_series() {
    let metrics = Metrics::init(100).expect("install recorder");
    assert!(Metrics::init(100).is_err(), "second recorder must be refused");

    let mut h = harness(fixture_sources(), CountingGenerator::default(), 100, 3);
    h.job.execute().await.expect("fixture run");

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "job_runs_total",
        "job_topics_processed_total",
        "ingest_events_total",
        "ingest_kept_total",
        "ingest_filtered_total",
        "ingest_dedup_total",
        "ingest_parse_ms",
        "novelty_history_cap",
        "job_last_run_ts",
        "# HELP job_last_run_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
