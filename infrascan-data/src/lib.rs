//! Geodata access for infrastructure discovery.
//!
//! Responsibilities:
//! - Build Overpass QL queries for an area of interest.
//! - Fetch and decode Overpass responses over HTTP.
//! - Retry failed fetches under a fixed-delay policy that honours
//!   cancellation.
//!
//! Boundaries:
//! - Do not classify or reshape elements (lives in `infrascan-core`).
//!
//! Invariants:
//! - No global mutable state; sources are `Send + Sync` and cheap to share.

#![forbid(unsafe_code)]

pub mod overpass;

pub use overpass::{
    DEFAULT_OVERPASS_URL, DEFAULT_USER_AGENT, ElementSource, FetchError, HttpOverpassSource,
    OverpassQuery, OverpassSourceConfig, RetryPolicy, SourceBuildError, SourceError,
    fetch_with_retry,
};
