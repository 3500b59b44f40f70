//! Canned elements and AOIs shared by unit and behaviour tests.

use geo::Coord;

use crate::{RawElement, Tags};

/// Build a tag map from borrowed pairs.
#[must_use]
pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// `GeoJSON` polygon covering the unit square `[0, 1] x [0, 1]`.
pub const UNIT_SQUARE_AOI: &str =
    r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

/// Closed ring around `(0.2, 0.2)`..`(0.4, 0.4)`, inside the unit square.
#[must_use]
pub fn footprint_ring() -> Vec<Coord<f64>> {
    vec![
        Coord { x: 0.2, y: 0.2 },
        Coord { x: 0.4, y: 0.2 },
        Coord { x: 0.4, y: 0.4 },
        Coord { x: 0.2, y: 0.4 },
        Coord { x: 0.2, y: 0.2 },
    ]
}

/// A closed building way with id `100`.
#[must_use]
pub fn building_way() -> RawElement {
    RawElement::way(100, footprint_ring(), tags(&[("building", "yes")]))
}

/// A hospital node with id `200` at `(0.5, 0.5)`.
#[must_use]
pub fn hospital_node() -> RawElement {
    RawElement::node(
        200,
        Coord { x: 0.5, y: 0.5 },
        tags(&[("amenity", "hospital"), ("name", "General")]),
    )
}

/// An open highway way with id `300`.
#[must_use]
pub fn road_way() -> RawElement {
    RawElement::way(
        300,
        vec![Coord { x: 0.1, y: 0.1 }, Coord { x: 0.9, y: 0.9 }],
        tags(&[("highway", "residential")]),
    )
}

/// A building relation with id `400`; never converted.
#[must_use]
pub fn building_relation() -> RawElement {
    RawElement::relation(400, tags(&[("building", "yes"), ("type", "multipolygon")]))
}
