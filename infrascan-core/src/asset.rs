//! Typed infrastructure assets and their `GeoJSON` wire form.

use std::collections::BTreeMap;
use std::fmt;

use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification assigned to a discovered asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Any tagged building.
    Building,
    /// Any highway, from motorways to footpaths.
    Road,
    /// Overhead or underground power line.
    PowerLine,
    /// Power towers and poles.
    PowerInfrastructure,
    /// Any railway feature.
    Railway,
    /// Hospital amenity.
    Hospital,
    /// Fire station amenity.
    FireStation,
}

impl AssetKind {
    /// Every kind, in classification precedence order.
    pub const ALL: [Self; 7] = [
        Self::Building,
        Self::Road,
        Self::PowerLine,
        Self::PowerInfrastructure,
        Self::Railway,
        Self::Hospital,
        Self::FireStation,
    ];

    /// The wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Road => "road",
            Self::PowerLine => "power_line",
            Self::PowerInfrastructure => "power_infrastructure",
            Self::Railway => "railway",
            Self::Hospital => "hospital",
            Self::FireStation => "fire_station",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while encoding an asset geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A vertex carried a NaN or infinite ordinate.
    #[error("geometry vertex {index} is not finite ({x}, {y})")]
    NonFinite {
        /// Position of the offending vertex.
        index: usize,
        /// Longitude as received.
        x: f64,
        /// Latitude as received.
        y: f64,
    },
    /// JSON encoding failed.
    #[error("failed to encode geometry as GeoJSON: {source}")]
    Encode {
        /// Encoder error.
        source: serde_json::Error,
    },
}

/// Normalised asset geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetGeometry {
    /// A single location.
    Point(Point<f64>),
    /// An open or closed chain of vertices.
    Line(LineString<f64>),
    /// A closed footprint with a single exterior ring.
    Polygon(Polygon<f64>),
}

/// `GeoJSON` geometry object, as exchanged on the wire.
///
/// Positions are `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeoJsonGeometry {
    /// `{"type": "Point", "coordinates": [x, y]}`
    Point([f64; 2]),
    /// `{"type": "LineString", "coordinates": [[x, y], ...]}`
    LineString(Vec<[f64; 2]>),
    /// `{"type": "Polygon", "coordinates": [[[x, y], ...]]}`
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl AssetGeometry {
    /// Convert to the `GeoJSON` object model.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] when any vertex has a NaN or
    /// infinite ordinate, since `GeoJSON` cannot represent it.
    pub fn to_geojson(&self) -> Result<GeoJsonGeometry, GeometryError> {
        match self {
            Self::Point(point) => Ok(GeoJsonGeometry::Point(position(0, point.0)?)),
            Self::Line(line) => Ok(GeoJsonGeometry::LineString(positions(
                line.coords().copied(),
            )?)),
            Self::Polygon(polygon) => {
                let exterior = positions(polygon.exterior().coords().copied())?;
                Ok(GeoJsonGeometry::Polygon(vec![exterior]))
            }
        }
    }

    /// Encode as a `GeoJSON` string.
    ///
    /// # Errors
    ///
    /// Propagates [`AssetGeometry::to_geojson`] failures and wraps encoder
    /// errors in [`GeometryError::Encode`].
    pub fn to_geojson_string(&self) -> Result<String, GeometryError> {
        let geometry = self.to_geojson()?;
        serde_json::to_string(&geometry).map_err(|source| GeometryError::Encode { source })
    }
}

fn positions<C, I>(coords: I) -> Result<C, GeometryError>
where
    I: IntoIterator<Item = Coord<f64>>,
    C: FromIterator<[f64; 2]>,
{
    coords
        .into_iter()
        .enumerate()
        .map(|(index, coord)| position(index, coord))
        .collect()
}

const fn position(index: usize, coord: Coord<f64>) -> Result<[f64; 2], GeometryError> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok([coord.x, coord.y])
    } else {
        Err(GeometryError::NonFinite {
            index,
            x: coord.x,
            y: coord.y,
        })
    }
}

/// A classified, geometrically normalised infrastructure asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Classification.
    pub kind: AssetKind,
    /// Normalised geometry.
    pub geometry: AssetGeometry,
    /// Source tags plus `osm_id` and `osm_type` provenance.
    pub properties: BTreeMap<String, String>,
}

impl Asset {
    /// Encode the asset into its wire form.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] when the geometry cannot be encoded.
    pub fn to_record(&self) -> Result<AssetRecord, GeometryError> {
        Ok(AssetRecord {
            asset_type: self.kind.as_str().to_owned(),
            asset_geometry_geojson: self.geometry.to_geojson_string()?,
            properties: self.properties.clone(),
        })
    }
}

/// Wire form of an [`Asset`] returned across the RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// [`AssetKind`] wire name.
    pub asset_type: String,
    /// `GeoJSON` geometry object, encoded as a string.
    pub asset_geometry_geojson: String,
    /// String properties.
    pub properties: BTreeMap<String, String>,
}

/// Ordered assets plus their count.
///
/// Order follows the order elements were received from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCollection {
    /// Assets in source order.
    pub assets: Vec<AssetRecord>,
    /// Number of entries in `assets`.
    pub total_count: usize,
}

impl AssetCollection {
    /// Wrap `assets`, deriving the count.
    #[must_use]
    pub const fn new(assets: Vec<AssetRecord>) -> Self {
        let total_count = assets.len();
        Self {
            assets,
            total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn square() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 0.0 },
        ]
    }

    #[rstest]
    fn point_encodes_lon_lat() {
        let geometry = AssetGeometry::Point(Point::new(13.4, 52.5));
        let encoded = geometry.to_geojson_string().expect("finite point");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("valid JSON");
        assert_eq!(value, json!({"type": "Point", "coordinates": [13.4, 52.5]}));
    }

    #[rstest]
    fn line_encodes_every_vertex() {
        let geometry = AssetGeometry::Line(LineString::from(square()));
        let encoded = geometry.to_geojson().expect("finite line");
        match encoded {
            GeoJsonGeometry::LineString(positions) => assert_eq!(positions.len(), 4),
            other => panic!("expected LineString, got {other:?}"),
        }
    }

    #[rstest]
    fn polygon_encodes_single_exterior_ring() {
        let polygon = Polygon::new(LineString::from(square()), Vec::new());
        let encoded = AssetGeometry::Polygon(polygon)
            .to_geojson_string()
            .expect("finite polygon");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("valid JSON");
        assert_eq!(
            value,
            json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]})
        );
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn non_finite_vertices_fail_to_encode(#[case] bad: f64) {
        let line = LineString::from(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: bad, y: 1.0 }]);
        let err = AssetGeometry::Line(line)
            .to_geojson_string()
            .expect_err("non-finite vertex");
        assert!(matches!(err, GeometryError::NonFinite { index: 1, .. }), "got {err:?}");
    }

    #[rstest]
    fn kinds_serialise_as_snake_case() {
        for kind in AssetKind::ALL {
            let encoded = serde_json::to_string(&kind).expect("kind serialises");
            assert_eq!(encoded, format!("\"{}\"", kind.as_str()));
        }
    }

    #[rstest]
    fn collection_counts_assets() {
        let record = AssetRecord {
            asset_type: "road".to_owned(),
            asset_geometry_geojson: r#"{"type":"Point","coordinates":[0.0,0.0]}"#.to_owned(),
            properties: BTreeMap::new(),
        };
        let collection = AssetCollection::new(vec![record.clone(), record]);
        assert_eq!(collection.total_count, 2);
    }
}
