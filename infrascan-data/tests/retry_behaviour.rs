//! Behavioural tests for the fixed-delay retry loop.

use std::cell::RefCell;
use std::time::Duration;

use infrascan_core::RawElement;
use infrascan_core::test_support::{building_way, hospital_node};
use infrascan_data::overpass::test_support::StubElementSource;
use infrascan_data::{FetchError, OverpassQuery, RetryPolicy, SourceError, fetch_with_retry};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio_util::sync::CancellationToken;

type OutcomeCell = RefCell<Option<Result<Vec<RawElement>, FetchError>>>;

#[fixture]
fn source() -> RefCell<Option<StubElementSource>> {
    RefCell::new(None)
}

#[fixture]
fn policy() -> RefCell<RetryPolicy> {
    RefCell::new(RetryPolicy::default().with_retry_delay(Duration::from_millis(1)))
}

#[fixture]
fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[fixture]
fn outcome() -> OutcomeCell {
    RefCell::new(None)
}

fn upstream_error() -> SourceError {
    SourceError::Http {
        url: "stub://overpass".to_owned(),
        status: 503,
        body: "overloaded".to_owned(),
    }
}

#[given("an upstream that always fails")]
fn always_failing(#[from(source)] source: &RefCell<Option<StubElementSource>>) {
    *source.borrow_mut() = Some(StubElementSource::always_failing(upstream_error()));
}

#[given("an upstream that fails twice before answering")]
fn fails_twice(#[from(source)] source: &RefCell<Option<StubElementSource>>) {
    *source.borrow_mut() = Some(StubElementSource::failing_then(
        2,
        upstream_error(),
        vec![building_way(), hospital_node()],
    ));
}

#[given("a retry budget of {count} retries")]
fn retry_budget(count: u32, #[from(policy)] policy: &RefCell<RetryPolicy>) {
    let updated = policy.borrow().with_max_retries(count);
    *policy.borrow_mut() = updated;
}

#[given("the request has been cancelled")]
fn request_cancelled(#[from(cancel)] cancel: &CancellationToken) {
    cancel.cancel();
}

#[when("I fetch the query")]
fn fetch_query(
    #[from(source)] source: &RefCell<Option<StubElementSource>>,
    #[from(policy)] policy: &RefCell<RetryPolicy>,
    #[from(cancel)] cancel: &CancellationToken,
    #[from(outcome)] outcome: &OutcomeCell,
) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("test runtime");
    let borrowed = source.borrow();
    let stub = borrowed.as_ref().expect("upstream configured");
    let query = OverpassQuery::from_raw("[out:json];node(0,0,1,1);out geom;");
    let policy_value = *policy.borrow();
    let result = runtime.block_on(fetch_with_retry(stub, &query, &policy_value, cancel));
    *outcome.borrow_mut() = Some(result);
}

#[then("the fetch is exhausted after {attempts} attempts")]
fn exhausted(attempts: u32, #[from(outcome)] outcome: &OutcomeCell) {
    let borrowed = outcome.borrow();
    match borrowed.as_ref() {
        Some(Err(FetchError::Exhausted {
            attempts: actual, ..
        })) => assert_eq!(*actual, attempts),
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[then("the fetch is cancelled")]
fn cancelled(#[from(outcome)] outcome: &OutcomeCell) {
    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(Err(FetchError::Cancelled))
    ));
}

#[then("{count} elements are returned")]
fn elements_returned(count: usize, #[from(outcome)] outcome: &OutcomeCell) {
    let borrowed = outcome.borrow();
    let elements = borrowed
        .as_ref()
        .and_then(|result| result.as_ref().ok())
        .expect("expected elements");
    assert_eq!(elements.len(), count);
}

#[then("the upstream was asked {count} times")]
fn upstream_asked(count: usize, #[from(source)] source: &RefCell<Option<StubElementSource>>) {
    let borrowed = source.borrow();
    let stub = borrowed.as_ref().expect("upstream configured");
    assert_eq!(stub.attempts(), count);
}

#[scenario(path = "tests/features/retry.feature", index = 0)]
fn exhausts_budget(
    source: RefCell<Option<StubElementSource>>,
    policy: RefCell<RetryPolicy>,
    cancel: CancellationToken,
    outcome: OutcomeCell,
) {
    let _ = (source, policy, cancel, outcome);
}

#[scenario(path = "tests/features/retry.feature", index = 1)]
fn recovers(
    source: RefCell<Option<StubElementSource>>,
    policy: RefCell<RetryPolicy>,
    cancel: CancellationToken,
    outcome: OutcomeCell,
) {
    let _ = (source, policy, cancel, outcome);
}

#[scenario(path = "tests/features/retry.feature", index = 2)]
fn cancelled_not_retried(
    source: RefCell<Option<StubElementSource>>,
    policy: RefCell<RetryPolicy>,
    cancel: CancellationToken,
    outcome: OutcomeCell,
) {
    let _ = (source, policy, cancel, outcome);
}
