//! Facade crate for infrastructure asset discovery.
//!
//! This crate re-exports the domain types and the Overpass data layer, and
//! exposes the discovery service behind the `service` feature.

#![forbid(unsafe_code)]

pub use infrascan_core::{
    AoiError, AoiPayload, Asset, AssetCollection, AssetGeometry, AssetKind, AssetRecord, Bounds,
    DropReason, ElementKind, RawElement, Tags, classify, convert_element, extract_bounds,
};

pub use infrascan_data::{
    ElementSource, FetchError, HttpOverpassSource, OverpassQuery, OverpassSourceConfig,
    RetryPolicy, SourceError, fetch_with_retry,
};

#[cfg(feature = "service")]
pub use infrascan_service::{
    AssetDiscovery, DiscoveryError, DiscoveryOutcome, ErrorCode, RemoteDiscoveryClient, router,
    serve,
};
