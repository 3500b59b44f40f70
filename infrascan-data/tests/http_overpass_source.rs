//! Integration tests for [`HttpOverpassSource`] against a local stand-in.

mod support;

use std::time::Duration;

use axum::http::StatusCode;
use geo::Coord;
use infrascan_core::{Bounds, ElementKind};
use infrascan_data::{
    ElementSource, FetchError, HttpOverpassSource, OverpassQuery, OverpassSourceConfig,
    RetryPolicy, SourceError, fetch_with_retry,
};
use rstest::{fixture, rstest};
use support::{OverpassStandIn, SAMPLE_RESPONSE};
use tokio_util::sync::CancellationToken;

#[fixture]
fn query() -> OverpassQuery {
    OverpassQuery::for_bounds(&Bounds::from_corners(
        Coord { x: 0.0, y: 0.0 },
        Coord { x: 1.0, y: 1.0 },
    ))
}

fn source_for(stand_in: &OverpassStandIn) -> HttpOverpassSource {
    let config = OverpassSourceConfig::new(stand_in.url()).with_timeout(Duration::from_secs(5));
    HttpOverpassSource::with_config(config).expect("valid stand-in URL")
}

#[rstest]
#[tokio::test]
async fn posts_raw_query_as_form_body(query: OverpassQuery) {
    let stand_in = OverpassStandIn::start(StatusCode::OK, SAMPLE_RESPONSE).await;
    let source = source_for(&stand_in);

    let elements = source.fetch(&query).await.expect("stand-in answers");

    let requests = stand_in.requests();
    let request = requests.first().expect("one request");
    assert_eq!(request.body, query.as_str());
    assert_eq!(
        request.content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    let kinds: Vec<ElementKind> = elements.iter().map(|element| element.kind).collect();
    assert_eq!(kinds, vec![ElementKind::Way, ElementKind::Node]);
}

#[rstest]
#[tokio::test]
async fn non_ok_status_is_reported_with_body(query: OverpassQuery) {
    let stand_in =
        OverpassStandIn::start(StatusCode::TOO_MANY_REQUESTS, "rate limited").await;
    let source = source_for(&stand_in);

    let err = source.fetch(&query).await.expect_err("429 is a failure");
    assert!(
        matches!(&err, SourceError::Http { status: 429, body, .. } if body == "rate limited"),
        "got {err:?}"
    );
}

#[rstest]
#[tokio::test]
async fn malformed_json_is_a_decode_error(query: OverpassQuery) {
    let stand_in = OverpassStandIn::start(StatusCode::OK, "<html>busy</html>").await;
    let source = source_for(&stand_in);

    let err = source.fetch(&query).await.expect_err("HTML is not JSON");
    assert!(matches!(err, SourceError::Decode { .. }), "got {err:?}");
}

#[rstest]
#[tokio::test]
async fn retry_loop_sends_one_request_per_attempt(query: OverpassQuery) {
    let stand_in = OverpassStandIn::start(StatusCode::GATEWAY_TIMEOUT, "").await;
    let source = source_for(&stand_in);
    let policy = RetryPolicy::default()
        .with_max_retries(2)
        .with_retry_delay(Duration::from_millis(5));

    let err = fetch_with_retry(&source, &query, &policy, &CancellationToken::new())
        .await
        .expect_err("stand-in always fails");

    assert!(
        matches!(err, FetchError::Exhausted { attempts: 3, .. }),
        "got {err:?}"
    );
    assert_eq!(stand_in.requests().len(), 3);
}

#[rstest]
#[tokio::test]
async fn unreachable_endpoint_is_a_network_error(query: OverpassQuery) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    let source = HttpOverpassSource::new(format!("http://{addr}/api/interpreter"))
        .expect("valid URL");

    let err = source.fetch(&query).await.expect_err("nothing listening");
    assert!(matches!(err, SourceError::Network { .. }), "got {err:?}");
}
