//! Overpass API adapter.
//!
//! [`OverpassQuery`] renders the query for a bounding box,
//! [`HttpOverpassSource`] posts it and decodes the JSON reply, and
//! [`fetch_with_retry`] wraps any [`ElementSource`] in the fixed-delay retry
//! loop.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use geo::Coord;
//! use infrascan_core::Bounds;
//! use infrascan_data::overpass::{
//!     HttpOverpassSource, OverpassQuery, OverpassSourceConfig, RetryPolicy, fetch_with_retry,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OverpassSourceConfig::default().with_timeout(Duration::from_secs(30));
//! let source = HttpOverpassSource::with_config(config)?;
//! let bounds = Bounds::from_corners(Coord { x: -0.2, y: 51.4 }, Coord { x: 0.0, y: 51.6 });
//! let query = OverpassQuery::for_bounds(&bounds);
//! let elements =
//!     fetch_with_retry(&source, &query, &RetryPolicy::default(), &CancellationToken::new())
//!         .await?;
//! println!("{} elements", elements.len());
//! # Ok(())
//! # }
//! ```

mod fetch;
mod query;
mod response;
mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use fetch::{FetchError, RetryPolicy, fetch_with_retry};
pub use query::{OverpassQuery, QueryClause, QUERY_CLAUSES};
pub use response::{OverpassElement, OverpassPosition, OverpassResponse};
pub use source::{
    DEFAULT_OVERPASS_URL, DEFAULT_USER_AGENT, ElementSource, HttpOverpassSource,
    OverpassSourceConfig, SourceBuildError, SourceError,
};
