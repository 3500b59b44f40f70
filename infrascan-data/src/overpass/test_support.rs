//! Test utilities for Overpass consumers.
//!
//! [`StubElementSource`] replays a scripted sequence of responses and counts
//! how often it was asked, so retry behaviour can be checked without a
//! network.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use infrascan_core::RawElement;

use super::query::OverpassQuery;
use super::source::{ElementSource, SourceError};

const STUB_ENDPOINT: &str = "stub://overpass";

/// Scripted [`ElementSource`].
///
/// Each call pops the next scripted response; once the script is exhausted
/// the fallback response is repeated.
///
/// # Example
///
/// ```
/// use infrascan_data::overpass::{ElementSource, OverpassQuery, SourceError};
/// use infrascan_data::overpass::test_support::StubElementSource;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let error = SourceError::Network {
///     url: "stub://overpass".to_owned(),
///     message: "connection reset".to_owned(),
/// };
/// let source = StubElementSource::failing_then(1, error, Vec::new());
/// let query = OverpassQuery::from_raw("out;");
/// assert!(source.fetch(&query).await.is_err());
/// assert!(source.fetch(&query).await.is_ok());
/// assert_eq!(source.attempts(), 2);
/// # });
/// ```
#[derive(Debug)]
pub struct StubElementSource {
    script: Mutex<VecDeque<StubResponse>>,
    fallback: StubResponse,
    attempts: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Elements(Vec<RawElement>),
    Error(SourceError),
    Hang,
}

impl StubElementSource {
    fn scripted(script: Vec<StubResponse>, fallback: StubResponse) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            attempts: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Source that always returns `elements`.
    #[must_use]
    pub fn succeeding(elements: Vec<RawElement>) -> Self {
        Self::scripted(Vec::new(), StubResponse::Elements(elements))
    }

    /// Source that always fails with `error`.
    #[must_use]
    pub fn always_failing(error: SourceError) -> Self {
        Self::scripted(Vec::new(), StubResponse::Error(error))
    }

    /// Source that fails `failures` times with `error`, then returns
    /// `elements` forever.
    #[must_use]
    pub fn failing_then(failures: usize, error: SourceError, elements: Vec<RawElement>) -> Self {
        let script = std::iter::repeat_n(StubResponse::Error(error), failures).collect();
        Self::scripted(script, StubResponse::Elements(elements))
    }

    /// Source whose requests never complete.
    #[must_use]
    pub fn hanging() -> Self {
        Self::scripted(Vec::new(), StubResponse::Hang)
    }

    /// Number of fetches started so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Query texts received, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    fn next_response(&self) -> StubResponse {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ElementSource for StubElementSource {
    fn endpoint(&self) -> &str {
        STUB_ENDPOINT
    }

    async fn fetch(&self, query: &OverpassQuery) -> Result<Vec<RawElement>, SourceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.as_str().to_owned());
        }
        match self.next_response() {
            StubResponse::Elements(elements) => Ok(elements),
            StubResponse::Error(error) => Err(error),
            StubResponse::Hang => std::future::pending().await,
        }
    }
}
