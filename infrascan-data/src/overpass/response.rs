//! Overpass JSON response types.
//!
//! Only the fields produced by `out geom;` that the converter needs are
//! modelled; anything else in the payload is ignored.

use geo::Coord;
use infrascan_core::{ElementKind, RawElement, Tags};
use serde::Deserialize;

/// Top-level Overpass reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverpassResponse {
    /// Elements in the order the server emitted them.
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// A single element as emitted by Overpass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverpassElement {
    /// `node`, `way`, or `relation`.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Element identifier.
    pub id: i64,
    /// Node latitude.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Node longitude.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Tags,
    /// Way vertices, present when the query asks for `out geom`.
    #[serde(default)]
    pub geometry: Vec<OverpassPosition>,
}

/// A `{lat, lon}` vertex.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OverpassPosition {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl From<OverpassPosition> for Coord<f64> {
    fn from(position: OverpassPosition) -> Self {
        Self {
            x: position.lon,
            y: position.lat,
        }
    }
}

impl From<OverpassElement> for RawElement {
    fn from(element: OverpassElement) -> Self {
        let location = match (element.lat, element.lon) {
            (Some(lat), Some(lon)) => Some(Coord { x: lon, y: lat }),
            _ => None,
        };
        Self {
            kind: ElementKind::from_type_name(&element.element_type),
            id: element.id,
            location,
            geometry: element.geometry.into_iter().map(Coord::from).collect(),
            tags: element.tags,
        }
    }
}

impl OverpassResponse {
    /// Convert every element into a [`RawElement`], preserving order.
    #[must_use]
    pub fn into_elements(self) -> Vec<RawElement> {
        self.elements.into_iter().map(RawElement::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = r#"{
        "version": 0.6,
        "generator": "Overpass API",
        "elements": [
            {"type": "node", "id": 1, "lat": 51.5, "lon": -0.1, "tags": {"amenity": "hospital"}},
            {"type": "way", "id": 2, "tags": {"highway": "primary"},
             "bounds": {"minlat": 51.5, "minlon": -0.2, "maxlat": 51.6, "maxlon": -0.1},
             "geometry": [{"lat": 51.5, "lon": -0.2}, {"lat": 51.6, "lon": -0.1}]},
            {"type": "relation", "id": 3, "tags": {"building": "yes"}, "members": []},
            {"type": "node", "id": 4, "lat": 51.55, "lon": -0.15}
        ]
    }"#;

    #[rstest]
    fn decodes_elements_in_order() {
        let response: OverpassResponse = serde_json::from_str(SAMPLE).expect("valid sample");
        let elements = response.into_elements();
        let kinds: Vec<ElementKind> = elements.iter().map(|element| element.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Node,
                ElementKind::Way,
                ElementKind::Relation,
                ElementKind::Node
            ]
        );
    }

    #[rstest]
    fn positions_map_lat_lon_to_y_x() {
        let response: OverpassResponse = serde_json::from_str(SAMPLE).expect("valid sample");
        let elements = response.into_elements();
        let node = elements.first().expect("node");
        assert_eq!(node.location, Some(Coord { x: -0.1, y: 51.5 }));
        let way = elements.get(1).expect("way");
        assert_eq!(
            way.geometry,
            vec![Coord { x: -0.2, y: 51.5 }, Coord { x: -0.1, y: 51.6 }]
        );
        assert_eq!(way.location, None);
    }

    #[rstest]
    fn untagged_elements_have_empty_tags() {
        let response: OverpassResponse = serde_json::from_str(SAMPLE).expect("valid sample");
        let last = response.into_elements().pop().expect("trailing node");
        assert!(last.tags.is_empty());
    }

    #[rstest]
    fn missing_elements_list_decodes_empty() {
        let response: OverpassResponse = serde_json::from_str("{}").expect("empty object");
        assert!(response.elements.is_empty());
    }
}
