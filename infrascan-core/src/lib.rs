//! Core domain model for infrastructure asset discovery.
//!
//! Responsibilities:
//! - Validate area-of-interest payloads and derive their bounding box.
//! - Classify tagged geographic elements into asset kinds.
//! - Rebuild element geometry and encode it as `GeoJSON`.
//!
//! Boundaries:
//! - No I/O. Fetching elements lives in `infrascan-data`; the request facade
//!   and transport live in `infrascan-service`.
//!
//! Invariants:
//! - Classification is a pure function of an element's tags.
//! - Asset properties always carry `osm_id` and `osm_type`.

#![forbid(unsafe_code)]

pub mod aoi;
pub mod asset;
pub mod classify;
pub mod convert;
pub mod element;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aoi::{AoiError, AoiPayload, Bounds, extract_bounds};
pub use asset::{
    Asset, AssetCollection, AssetGeometry, AssetKind, AssetRecord, GeoJsonGeometry, GeometryError,
};
pub use classify::{CLASSIFICATION_RULES, ClassificationRule, TagPredicate, classify};
pub use convert::{DropReason, OSM_ID_PROPERTY, OSM_TYPE_PROPERTY, convert_element};
pub use element::{ElementKind, RawElement, Tags};
