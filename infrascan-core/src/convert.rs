//! Conversion of raw elements into typed assets.

use std::collections::BTreeMap;
use std::fmt;

use geo::{LineString, Point, Polygon};
use log::debug;
use thiserror::Error;

use crate::classify::classify;
use crate::element::{ElementKind, RawElement};
use crate::{Asset, AssetGeometry, AssetKind};

/// Property key carrying the source identifier.
pub const OSM_ID_PROPERTY: &str = "osm_id";
/// Property key carrying the source element type.
pub const OSM_TYPE_PROPERTY: &str = "osm_type";

/// Why an element produced no asset.
///
/// Dropping is not a failure of the request; callers count these for
/// diagnostics and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error)]
pub enum DropReason {
    /// No classification rule matched the element's tags.
    #[error("no classification rule matched")]
    Unclassified,
    /// Relations are not reconstructed.
    #[error("relations are not reconstructed")]
    Relation,
    /// The element type was not recognised.
    #[error("unsupported element type")]
    UnsupportedType,
    /// A node arrived without a coordinate.
    #[error("node has no coordinate")]
    MissingLocation,
    /// A way had fewer than two vertices.
    #[error("way has fewer than two vertices")]
    TooFewVertices,
}

impl DropReason {
    /// Stable label used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::Relation => "relation",
            Self::UnsupportedType => "unsupported_type",
            Self::MissingLocation => "missing_location",
            Self::TooFewVertices => "too_few_vertices",
        }
    }
}

struct ElementSummary<'a>(&'a RawElement);

impl fmt::Display for ElementSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.kind, self.0.id)
    }
}

/// Classify `element` and rebuild its geometry.
///
/// Nodes become points. Ways become lines, except closed building outlines
/// with more than three vertices, which become polygons. Relations are always
/// dropped.
///
/// # Errors
///
/// Returns the [`DropReason`] when the element yields no asset.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use infrascan_core::{AssetGeometry, AssetKind, RawElement, Tags, convert_element};
///
/// let ring = vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 1.0, y: 0.0 },
///     Coord { x: 1.0, y: 1.0 },
///     Coord { x: 0.0, y: 0.0 },
/// ];
/// let tags = Tags::from([("building".to_owned(), "yes".to_owned())]);
/// let asset = convert_element(&RawElement::way(42, ring, tags)).expect("building way");
/// assert_eq!(asset.kind, AssetKind::Building);
/// assert!(matches!(asset.geometry, AssetGeometry::Polygon(_)));
/// assert_eq!(asset.properties.get("osm_id").map(String::as_str), Some("42"));
/// ```
pub fn convert_element(element: &RawElement) -> Result<Asset, DropReason> {
    let kind = classify(&element.tags).ok_or(DropReason::Unclassified)?;
    let geometry = reconstruct_geometry(element, kind)?;

    let mut properties: BTreeMap<String, String> = element.tags.clone();
    properties.insert(OSM_ID_PROPERTY.to_owned(), element.id.to_string());
    properties.insert(OSM_TYPE_PROPERTY.to_owned(), element.kind.as_str().to_owned());

    Ok(Asset {
        kind,
        geometry,
        properties,
    })
}

fn reconstruct_geometry(
    element: &RawElement,
    kind: AssetKind,
) -> Result<AssetGeometry, DropReason> {
    match element.kind {
        ElementKind::Node => element
            .location
            .map(|location| AssetGeometry::Point(Point(location)))
            .ok_or_else(|| {
                debug!("Dropping {}: no coordinate", ElementSummary(element));
                DropReason::MissingLocation
            }),
        ElementKind::Way => way_geometry(element, kind),
        ElementKind::Relation => Err(DropReason::Relation),
        ElementKind::Other => Err(DropReason::UnsupportedType),
    }
}

fn way_geometry(element: &RawElement, kind: AssetKind) -> Result<AssetGeometry, DropReason> {
    let vertices = &element.geometry;
    if vertices.len() < 2 {
        debug!(
            "Dropping {}: {} vertices",
            ElementSummary(element),
            vertices.len()
        );
        return Err(DropReason::TooFewVertices);
    }
    let line = LineString::from(vertices.clone());
    if is_closed_outline(element, kind) {
        Ok(AssetGeometry::Polygon(Polygon::new(line, Vec::new())))
    } else {
        Ok(AssetGeometry::Line(line))
    }
}

/// A way is a footprint when it carries a building tag, has more than three
/// vertices, and ends exactly where it starts.
fn is_closed_outline(element: &RawElement, kind: AssetKind) -> bool {
    let carries_building = kind == AssetKind::Building || element.tag("building").is_some();
    carries_building
        && element.geometry.len() > 3
        && element.geometry.first() == element.geometry.last()
}
