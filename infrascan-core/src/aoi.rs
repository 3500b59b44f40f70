//! Area-of-interest parsing and bounding-box extraction.
//!
//! AOIs arrive as `GeoJSON` polygon geometries in nested-ring form. Only the
//! outer ring (the first entry of `coordinates`) is consulted; holes and any
//! further rings are ignored because the bounding box of the outer ring
//! already encloses them.
//!
//! Coordinates are taken as-is (`x = longitude`, `y = latitude`). No
//! reprojection is performed.

use geo::{Coord, Intersects, Rect};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while validating an AOI payload or extracting its bounds.
#[derive(Debug, Error)]
pub enum AoiError {
    /// The payload was empty or whitespace.
    #[error("aoi_geojson is required")]
    Empty,
    /// The payload was not valid JSON.
    #[error("invalid GeoJSON: {source}")]
    InvalidJson {
        /// Parser error reported by `serde_json`.
        source: serde_json::Error,
    },
    /// The payload had no non-empty `coordinates` array.
    #[error("no coordinates found in GeoJSON")]
    MissingCoordinates,
    /// The first ring was missing, not an array, or empty.
    #[error("invalid polygon structure")]
    InvalidRing,
    /// Every position in the outer ring was malformed.
    #[error("polygon ring contains no usable coordinates")]
    NoUsableCoordinates,
}

/// Axis-aligned latitude/longitude box enclosing an AOI.
///
/// Backed by a [`Rect`], so `min <= max` holds on both axes by construction.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use infrascan_core::Bounds;
///
/// let bounds = Bounds::from_corners(Coord { x: 1.0, y: 2.0 }, Coord { x: -1.0, y: 0.5 });
/// assert_eq!(bounds.min_lon(), -1.0);
/// assert_eq!(bounds.max_lat(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds(Rect<f64>);

impl Bounds {
    /// Degenerate bounds covering a single coordinate.
    #[must_use]
    pub fn from_coord(coord: Coord<f64>) -> Self {
        Self(Rect::new(coord, coord))
    }

    /// Bounds spanning two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self(Rect::new(a, b))
    }

    /// Southern edge.
    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.0.min().y
    }

    /// Western edge.
    #[must_use]
    pub fn min_lon(&self) -> f64 {
        self.0.min().x
    }

    /// Northern edge.
    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.0.max().y
    }

    /// Eastern edge.
    #[must_use]
    pub fn max_lon(&self) -> f64 {
        self.0.max().x
    }

    /// The underlying rectangle.
    #[must_use]
    pub const fn rect(&self) -> Rect<f64> {
        self.0
    }

    /// Whether `coord` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        // `Intersects` treats boundary points as inside the rectangle.
        self.0.intersects(&coord)
    }

    #[must_use]
    fn including(self, coord: Coord<f64>) -> Self {
        let min = Coord {
            x: self.0.min().x.min(coord.x),
            y: self.0.min().y.min(coord.y),
        };
        let max = Coord {
            x: self.0.max().x.max(coord.x),
            y: self.0.max().y.max(coord.y),
        };
        Self(Rect::new(min, max))
    }
}

/// A structurally valid AOI payload.
///
/// Parsing only checks that the payload is non-empty JSON; the polygon shape
/// is inspected lazily by [`AoiPayload::bounds`].
///
/// # Examples
///
/// ```
/// use infrascan_core::AoiPayload;
///
/// # fn main() -> Result<(), infrascan_core::AoiError> {
/// let aoi = AoiPayload::parse(
///     r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#,
/// )?;
/// assert_eq!(aoi.geometry_type(), Some("Polygon"));
/// let bounds = aoi.bounds()?;
/// assert_eq!(bounds.max_lat(), 1.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AoiPayload {
    value: Value,
}

impl AoiPayload {
    /// Validate that `payload` is non-empty, parseable JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AoiError::Empty`] for blank input and
    /// [`AoiError::InvalidJson`] when the payload does not parse.
    pub fn parse(payload: &str) -> Result<Self, AoiError> {
        if payload.trim().is_empty() {
            return Err(AoiError::Empty);
        }
        let value =
            serde_json::from_str(payload).map_err(|source| AoiError::InvalidJson { source })?;
        Ok(Self { value })
    }

    /// The `GeoJSON` `type` member, when present.
    #[must_use]
    pub fn geometry_type(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }

    /// Compute the bounding box of the outer ring.
    ///
    /// Positions with fewer than two numeric components are skipped. The
    /// box starts at the first usable position and widens to include every
    /// later one.
    ///
    /// # Errors
    ///
    /// Returns [`AoiError::MissingCoordinates`] or [`AoiError::InvalidRing`]
    /// when the nested-ring structure is absent, and
    /// [`AoiError::NoUsableCoordinates`] when no position survives parsing.
    pub fn bounds(&self) -> Result<Bounds, AoiError> {
        let ring = self.outer_ring()?;
        let mut positions = ring.iter().filter_map(parse_position);
        let first = positions.next().ok_or(AoiError::NoUsableCoordinates)?;
        Ok(positions.fold(Bounds::from_coord(first), Bounds::including))
    }

    fn outer_ring(&self) -> Result<&[Value], AoiError> {
        let rings = self
            .value
            .get("coordinates")
            .and_then(Value::as_array)
            .filter(|rings| !rings.is_empty())
            .ok_or(AoiError::MissingCoordinates)?;
        rings
            .first()
            .and_then(Value::as_array)
            .filter(|ring| !ring.is_empty())
            .map(Vec::as_slice)
            .ok_or(AoiError::InvalidRing)
    }
}

/// Parse `payload` and compute its bounds in one step.
///
/// # Errors
///
/// Propagates any [`AoiError`] from [`AoiPayload::parse`] or
/// [`AoiPayload::bounds`].
pub fn extract_bounds(payload: &str) -> Result<Bounds, AoiError> {
    AoiPayload::parse(payload)?.bounds()
}

fn parse_position(position: &Value) -> Option<Coord<f64>> {
    let [lon, lat, ..] = position.as_array()?.as_slice() else {
        return None;
    };
    Some(Coord {
        x: lon.as_f64()?,
        y: lat.as_f64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    #[rstest]
    fn square_yields_unit_box() {
        let bounds = extract_bounds(SQUARE).expect("square should parse");
        assert_eq!(bounds.min_lon(), 0.0);
        assert_eq!(bounds.min_lat(), 0.0);
        assert_eq!(bounds.max_lon(), 1.0);
        assert_eq!(bounds.max_lat(), 1.0);
    }

    #[rstest]
    fn longitude_maps_to_x_and_latitude_to_y() {
        let payload = r#"{"type":"Polygon","coordinates":[[[-122.5,37.7],[-122.3,37.9],[-122.4,37.8]]]}"#;
        let bounds = extract_bounds(payload).expect("polygon should parse");
        assert_eq!(bounds.min_lon(), -122.5);
        assert_eq!(bounds.max_lon(), -122.3);
        assert_eq!(bounds.min_lat(), 37.7);
        assert_eq!(bounds.max_lat(), 37.9);
    }

    #[rstest]
    fn single_coordinate_degenerates_to_point() {
        let payload = r#"{"type":"Polygon","coordinates":[[[5.5,-3.25],[5.5,-3.25]]]}"#;
        let bounds = extract_bounds(payload).expect("point ring should parse");
        assert_eq!(bounds.min_lon(), bounds.max_lon());
        assert_eq!(bounds.min_lat(), bounds.max_lat());
        assert!(bounds.contains(Coord { x: 5.5, y: -3.25 }));
    }

    #[rstest]
    fn only_outer_ring_is_consulted() {
        let payload = r#"{"type":"Polygon","coordinates":[[[0,0],[2,2]],[[-50,-50],[50,50]]]}"#;
        let bounds = extract_bounds(payload).expect("polygon should parse");
        assert_eq!(bounds.min_lon(), 0.0);
        assert_eq!(bounds.max_lat(), 2.0);
    }

    #[rstest]
    fn malformed_positions_are_skipped() {
        let payload = r#"{"type":"Polygon","coordinates":[[[9],"junk",[1,"a"],[3,4],[-1,6,100]]]}"#;
        let bounds = extract_bounds(payload).expect("usable positions remain");
        assert_eq!(bounds.min_lon(), -1.0);
        assert_eq!(bounds.max_lon(), 3.0);
        assert_eq!(bounds.min_lat(), 4.0);
        assert_eq!(bounds.max_lat(), 6.0);
    }

    #[rstest]
    fn bounds_contain_every_input_coordinate() {
        let coords = [(3.0, -2.0), (-7.5, 11.0), (0.25, 0.0), (12.0, -9.5), (-1.0, 4.0)];
        let ring: Vec<String> = coords
            .iter()
            .map(|(lon, lat)| format!("[{lon},{lat}]"))
            .collect();
        let payload = format!(r#"{{"type":"Polygon","coordinates":[[{}]]}}"#, ring.join(","));
        let bounds = extract_bounds(&payload).expect("polygon should parse");
        assert!(bounds.min_lat() <= bounds.max_lat());
        assert!(bounds.min_lon() <= bounds.max_lon());
        for (lon, lat) in coords {
            assert!(
                bounds.contains(Coord { x: lon, y: lat }),
                "bounds {bounds:?} should contain ({lon}, {lat})"
            );
        }
    }

    #[rstest]
    #[case::blank("   ")]
    #[case::empty("")]
    fn rejects_empty_payload(#[case] payload: &str) {
        assert!(matches!(AoiPayload::parse(payload), Err(AoiError::Empty)));
    }

    #[rstest]
    fn rejects_invalid_json() {
        assert!(matches!(
            AoiPayload::parse("{not json"),
            Err(AoiError::InvalidJson { .. })
        ));
    }

    #[rstest]
    #[case::no_member(r#"{"type":"Polygon"}"#)]
    #[case::empty_array(r#"{"type":"Polygon","coordinates":[]}"#)]
    #[case::not_object("[1,2,3]")]
    fn rejects_missing_coordinates(#[case] payload: &str) {
        let err = extract_bounds(payload).expect_err("coordinates are required");
        assert!(matches!(err, AoiError::MissingCoordinates), "got {err:?}");
    }

    #[rstest]
    #[case::empty_ring(r#"{"type":"Polygon","coordinates":[[]]}"#)]
    #[case::scalar_ring(r#"{"type":"Polygon","coordinates":[5]}"#)]
    fn rejects_invalid_ring(#[case] payload: &str) {
        let err = extract_bounds(payload).expect_err("ring is required");
        assert!(matches!(err, AoiError::InvalidRing), "got {err:?}");
    }

    #[rstest]
    fn rejects_ring_without_usable_positions() {
        let payload = r#"{"type":"Polygon","coordinates":[[[1],["a","b"],null]]}"#;
        let err = extract_bounds(payload).expect_err("no usable positions");
        assert!(matches!(err, AoiError::NoUsableCoordinates), "got {err:?}");
    }

    #[rstest]
    fn structural_validation_accepts_non_polygon_json() {
        let aoi = AoiPayload::parse(r#"{"type":"Point","coordinates":[1,2]}"#)
            .expect("any JSON passes structural validation");
        assert_eq!(aoi.geometry_type(), Some("Point"));
    }
}
